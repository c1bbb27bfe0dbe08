//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Services**: Stateless business logic
//!
//! # Bounded Contexts
//!
//! - [`trade_lifecycle`]: Option trades, parent/child chains, status and realized P&L
//! - [`stock_ledger`]: Share lots and covered call reservations
//! - [`accounts`]: Account ownership, fee defaults and cash flows

pub mod accounts;
pub mod shared;
pub mod stock_ledger;
pub mod trade_lifecycle;
