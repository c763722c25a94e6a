//! SeaORM entity modules for the personal-finance ledger: accounts,
//! categories, the transaction ledger itself, monthly budgets, debts
//! with their payments, and recurring subscriptions.

pub mod account;
pub mod budget;
pub mod category;
pub mod debt;
pub mod debt_payment;
pub mod subscription;
pub mod transaction;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::budget::Entity as Budget;
    pub use super::category::Entity as Category;
    pub use super::debt::Entity as Debt;
    pub use super::debt_payment::Entity as DebtPayment;
    pub use super::subscription::Entity as Subscription;
    pub use super::transaction::Entity as Transaction;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let checking = account::ActiveModel {
            name: Set("Checking".to_string()),
            kind: Set(account::AccountKind::Bank),
            currency: Set("IDR".to_string()),
            initial_balance: Set(100_000),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let wallet = account::ActiveModel {
            name: Set("Wallet".to_string()),
            kind: Set(account::AccountKind::Cash),
            currency: Set("IDR".to_string()),
            initial_balance: Set(0),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let groceries = category::ActiveModel {
            name: Set("Groceries".to_string()),
            kind: Set(category::CategoryKind::Expense),
            is_budgetable: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let expense = transaction::ActiveModel {
            kind: Set(transaction::TransactionKind::Expense),
            amount: Set(-20_000),
            date: Set(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()),
            account_id: Set(Some(checking.id)),
            category_id: Set(Some(groceries.id)),
            note: Set(Some("Weekly shop".to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // A transfer pair: out-row and in-row sharing a group id.
        let group = "3f0a9e6c-0000-0000-0000-000000000001".to_string();
        transaction::ActiveModel {
            kind: Set(transaction::TransactionKind::Transfer),
            amount: Set(-5_000),
            date: Set(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()),
            from_account_id: Set(Some(checking.id)),
            transfer_group_id: Set(Some(group.clone())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        transaction::ActiveModel {
            kind: Set(transaction::TransactionKind::Transfer),
            amount: Set(5_000),
            date: Set(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()),
            to_account_id: Set(Some(wallet.id)),
            transfer_group_id: Set(Some(group.clone())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let budget = budget::ActiveModel {
            month: Set("2026-01".to_string()),
            category_id: Set(groceries.id),
            amount: Set(250_000),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let debt = debt::ActiveModel {
            kind: Set(debt::DebtKind::Payable),
            counterparty_name: Set("Landlord".to_string()),
            principal_amount: Set(1_000_000),
            remaining_amount: Set(1_000_000),
            due_date: Set(Some(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap())),
            status: Set(debt::DebtStatus::Open),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        debt_payment::ActiveModel {
            debt_id: Set(debt.id),
            amount: Set(400_000),
            date: Set(NaiveDate::from_ymd_opt(2026, 1, 25).unwrap()),
            account_id: Set(Some(checking.id)),
            transaction_id: Set(Some(expense.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        subscription::ActiveModel {
            name: Set("Streaming".to_string()),
            amount: Set(54_000),
            frequency: Set(subscription::Frequency::Monthly),
            next_due_date: Set(NaiveDate::from_ymd_opt(2026, 2, 3).unwrap()),
            account_id: Set(Some(checking.id)),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let accounts = Account::find().all(&db).await?;
        assert_eq!(accounts.len(), 2);

        let rows = Transaction::find().all(&db).await?;
        assert_eq!(rows.len(), 3);

        let pair = Transaction::find()
            .filter(transaction::Column::TransferGroupId.eq(group))
            .all(&db)
            .await?;
        assert_eq!(pair.len(), 2);
        assert_eq!(pair.iter().map(|t| t.amount).sum::<i64>(), 0);

        let budgets = Budget::find().all(&db).await?;
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].id, budget.id);

        let payments = DebtPayment::find()
            .filter(debt_payment::Column::DebtId.eq(debt.id))
            .all(&db)
            .await?;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 400_000);

        // Cascade: deleting the debt removes its payments.
        Debt::delete_by_id(debt.id).exec(&db).await?;
        let payments = DebtPayment::find().all(&db).await?;
        assert!(payments.is_empty());

        Ok(())
    }
}
