//! Read-side aggregation for monthly budgets: how much was actually
//! spent per category, and how that compares to the plan.

use std::collections::HashMap;

use model::entities::transaction::{self, TransactionKind};

/// Absolute expense totals per category over the given rows.
///
/// Only expense rows with a category participate; their stored amounts
/// are non-positive, so the total is the absolute value of the sum.
pub fn spent_by_category(rows: &[transaction::Model]) -> HashMap<i32, i64> {
    let mut spent = HashMap::new();
    for row in rows {
        if row.kind != TransactionKind::Expense {
            continue;
        }
        let Some(category_id) = row.category_id else {
            continue;
        };
        *spent.entry(category_id).or_insert(0) += row.amount.abs();
    }
    spent
}

/// Planned minus spent, floored at zero.
pub fn remaining(planned: i64, spent: i64) -> i64 {
    (planned - spent).max(0)
}

/// Spent as a percentage of planned, rounded, capped at 100.
pub fn percent_used(planned: i64, spent: i64) -> u8 {
    if planned <= 0 {
        return 0;
    }
    let percent = (spent as f64 / planned as f64 * 100.0).round() as i64;
    percent.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn expense(category_id: Option<i32>, amount: i64) -> transaction::Model {
        transaction::Model {
            id: 0,
            kind: TransactionKind::Expense,
            amount,
            date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            account_id: Some(1),
            category_id,
            from_account_id: None,
            to_account_id: None,
            transfer_group_id: None,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sums_absolute_expense_amounts_per_category() {
        let rows = vec![
            expense(Some(1), -10_000),
            expense(Some(1), -2_500),
            expense(Some(2), -7_000),
            expense(None, -99_000),
        ];
        let spent = spent_by_category(&rows);
        assert_eq!(spent.get(&1), Some(&12_500));
        assert_eq!(spent.get(&2), Some(&7_000));
        assert_eq!(spent.len(), 2);
    }

    #[test]
    fn income_rows_are_ignored() {
        let mut row = expense(Some(1), 5_000);
        row.kind = TransactionKind::Income;
        assert!(spent_by_category(&[row]).is_empty());
    }

    #[test]
    fn remaining_floors_at_zero() {
        assert_eq!(remaining(100_000, 40_000), 60_000);
        assert_eq!(remaining(100_000, 140_000), 0);
    }

    #[test]
    fn percent_caps_at_one_hundred() {
        assert_eq!(percent_used(200_000, 50_000), 25);
        assert_eq!(percent_used(200_000, 999_000), 100);
        assert_eq!(percent_used(0, 10), 0);
        assert_eq!(percent_used(3, 1), 33);
    }
}
