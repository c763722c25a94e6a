pub mod accounts;
pub mod backup;
pub mod budgets;
pub mod categories;
pub mod debts;
pub mod exports;
pub mod health;
pub mod import;
pub mod subscriptions;
pub mod summary;
pub mod transactions;
