use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The kind of account holding the money.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[sea_orm(string_value = "bank")]
    Bank,
    #[sea_orm(string_value = "ewallet")]
    EWallet,
    #[sea_orm(string_value = "cash")]
    Cash,
}

/// A place money lives: a bank account, an e-wallet, or physical cash.
///
/// The current balance is never stored; it is always derived as
/// `initial_balance` plus the signed sum of the ledger rows touching
/// the account.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub kind: AccountKind,
    /// ISO 4217 currency code, e.g. "IDR", "USD".
    pub currency: String,
    /// Opening balance in the smallest currency unit.
    pub initial_balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Income/expense rows booked directly against this account.
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
    #[sea_orm(has_many = "super::subscription::Entity")]
    Subscription,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
