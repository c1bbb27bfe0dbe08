//! Shared Domain Types
//!
//! Value objects and errors shared across bounded contexts.

pub mod errors;
pub mod value_objects;

pub use errors::DomainError;
pub use value_objects::{
    AccountId, Money, SHARES_PER_CONTRACT, StockPositionId, Symbol, TradeId, UserId,
    contract_notional, shares_for,
};
