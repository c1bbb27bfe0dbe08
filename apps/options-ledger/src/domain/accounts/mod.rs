//! Accounts Bounded Context
//!
//! Accounts own trades and share lots and carry fee defaults.

mod account;

pub use account::{Account, CashFlow, CashFlowKind};
