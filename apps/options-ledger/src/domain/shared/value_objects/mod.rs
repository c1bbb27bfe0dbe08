//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod contracts;
mod identifiers;
mod money;
mod symbol;

pub use contracts::{SHARES_PER_CONTRACT, contract_notional, shares_for};
pub use identifiers::{AccountId, StockPositionId, TradeId, UserId};
pub use money::Money;
pub use symbol::Symbol;
