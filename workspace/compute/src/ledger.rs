//! The canonical balance formula.
//!
//! Every row stores a signed amount relative to the account it names:
//! income rows are non-negative, expense rows non-positive, and a
//! transfer pair carries `-amount` on its `from_account_id` row and
//! `+amount` on its `to_account_id` row. An account's balance is
//! therefore a single signed pass over the rows touching it. Earlier
//! route implementations of this app disagreed on the transfer terms;
//! this module is the one formula used everywhere.

use model::entities::{account, transaction};
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{debug, instrument};

use crate::error::Result;

/// Signed contribution of all rows touching `account_id`.
///
/// Invariant under reordering of `rows`; a row contributes its stored
/// amount exactly once (a ledger row names an account in at most one of
/// the three columns).
pub fn signed_sum(account_id: i32, rows: &[transaction::Model]) -> i64 {
    rows.iter()
        .filter(|row| {
            row.account_id == Some(account_id)
                || row.from_account_id == Some(account_id)
                || row.to_account_id == Some(account_id)
        })
        .map(|row| row.amount)
        .sum()
}

/// `initial_balance + signed_sum(rows)` for one account.
pub fn balance(initial_balance: i64, account_id: i32, rows: &[transaction::Model]) -> i64 {
    initial_balance + signed_sum(account_id, rows)
}

/// Condition matching every ledger row that touches the account.
pub fn touching_account(account_id: i32) -> Condition {
    Condition::any()
        .add(transaction::Column::AccountId.eq(account_id))
        .add(transaction::Column::FromAccountId.eq(account_id))
        .add(transaction::Column::ToAccountId.eq(account_id))
}

/// Current balance of an account, recomputed from the full row set.
#[instrument(skip(db, account), fields(account_id = account.id))]
pub async fn account_balance<C: ConnectionTrait>(
    db: &C,
    account: &account::Model,
) -> Result<i64> {
    let rows = transaction::Entity::find()
        .filter(touching_account(account.id))
        .all(db)
        .await?;
    debug!("Recomputed balance from {} ledger rows", rows.len());
    Ok(balance(account.initial_balance, account.id, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use model::entities::transaction::TransactionKind;

    fn row(
        id: i32,
        kind: TransactionKind,
        amount: i64,
        account_id: Option<i32>,
        from: Option<i32>,
        to: Option<i32>,
    ) -> transaction::Model {
        transaction::Model {
            id,
            kind,
            amount,
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            account_id,
            category_id: None,
            from_account_id: from,
            to_account_id: to,
            transfer_group_id: None,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn balance_is_initial_plus_signed_sum() {
        // The worked example: initial 100_000, expense -20_000,
        // transfer-in +5_000 => 85_000.
        let rows = vec![
            row(1, TransactionKind::Expense, -20_000, Some(1), None, None),
            row(2, TransactionKind::Transfer, 5_000, None, None, Some(1)),
        ];
        assert_eq!(balance(100_000, 1, &rows), 85_000);
    }

    #[test]
    fn signed_sum_is_order_independent() {
        let mut rows = vec![
            row(1, TransactionKind::Income, 30_000, Some(7), None, None),
            row(2, TransactionKind::Expense, -12_500, Some(7), None, None),
            row(3, TransactionKind::Transfer, -4_000, None, Some(7), None),
            row(4, TransactionKind::Transfer, 4_000, None, None, Some(2)),
        ];
        let forward = signed_sum(7, &rows);
        rows.reverse();
        assert_eq!(signed_sum(7, &rows), forward);
        assert_eq!(forward, 30_000 - 12_500 - 4_000);
    }

    #[test]
    fn transfer_pair_preserves_total_across_accounts() {
        let rows = vec![
            row(1, TransactionKind::Transfer, -9_000, None, Some(1), None),
            row(2, TransactionKind::Transfer, 9_000, None, None, Some(2)),
        ];
        let total = balance(50_000, 1, &rows) + balance(10_000, 2, &rows);
        assert_eq!(total, 60_000);
        assert_eq!(balance(50_000, 1, &rows), 41_000);
        assert_eq!(balance(10_000, 2, &rows), 19_000);
    }

    #[test]
    fn rows_for_other_accounts_do_not_contribute() {
        let rows = vec![row(1, TransactionKind::Income, 99_999, Some(2), None, None)];
        assert_eq!(balance(100, 1, &rows), 100);
    }

    mod db {
        use migration::{Migrator, MigratorTrait};
        use model::entities::account::AccountKind;
        use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, Set};
        use std::result::Result;

        use super::*;

        async fn setup_db() -> Result<DatabaseConnection, DbErr> {
            let db = Database::connect("sqlite::memory:").await?;
            Migrator::up(&db, None).await.expect("Migrations failed.");
            Ok(db)
        }

        async fn insert_account(
            db: &DatabaseConnection,
            name: &str,
            initial_balance: i64,
        ) -> Result<account::Model, DbErr> {
            account::ActiveModel {
                name: Set(name.to_string()),
                kind: Set(AccountKind::Bank),
                currency: Set("IDR".to_string()),
                initial_balance: Set(initial_balance),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await
        }

        async fn insert_row(
            db: &DatabaseConnection,
            model: transaction::Model,
        ) -> Result<(), DbErr> {
            transaction::ActiveModel {
                kind: Set(model.kind),
                amount: Set(model.amount),
                date: Set(model.date),
                account_id: Set(model.account_id),
                from_account_id: Set(model.from_account_id),
                to_account_id: Set(model.to_account_id),
                created_at: Set(model.created_at),
                ..Default::default()
            }
            .insert(db)
            .await?;
            Ok(())
        }

        #[tokio::test]
        async fn account_balance_matches_in_memory_formula() -> Result<(), DbErr> {
            let db = setup_db().await?;
            let main = insert_account(&db, "Main", 100_000).await?;
            let other = insert_account(&db, "Other", 0).await?;

            insert_row(
                &db,
                row(0, TransactionKind::Expense, -20_000, Some(main.id), None, None),
            )
            .await?;
            insert_row(
                &db,
                row(
                    0,
                    TransactionKind::Transfer,
                    5_000,
                    None,
                    None,
                    Some(main.id),
                ),
            )
            .await?;
            // A row for another account must not leak through the filter.
            insert_row(
                &db,
                row(0, TransactionKind::Income, 77_000, Some(other.id), None, None),
            )
            .await?;

            assert_eq!(account_balance(&db, &main).await.unwrap(), 85_000);
            assert_eq!(account_balance(&db, &other).await.unwrap(), 77_000);
            Ok(())
        }
    }
}
