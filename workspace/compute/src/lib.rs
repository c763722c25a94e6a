//! Ledger arithmetic shared by the HTTP handlers: account balances,
//! monthly budget aggregation, month ranges, and due-date schedules.
//!
//! Everything here is a pure function over already-fetched rows plus a
//! thin query wrapper; balances are recomputed from the full row set on
//! every read.

pub mod budget;
pub mod error;
pub mod ledger;
pub mod period;
pub mod schedule;

pub use error::{ComputeError, Result};
pub use ledger::{account_balance, balance, signed_sum};
pub use period::Month;
pub use schedule::advance_due;
