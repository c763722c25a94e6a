//! JSON-over-HTTP personal-finance tracker: accounts, categories, a
//! signed transaction ledger with paired transfers, monthly budgets,
//! debts and their payments, recurring subscriptions, dashboards, CSV
//! export, and JSON backup/restore.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod schemas;

#[cfg(test)]
mod test_utils;
