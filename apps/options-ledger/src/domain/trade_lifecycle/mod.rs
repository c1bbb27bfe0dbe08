//! Trade Lifecycle Bounded Context
//!
//! Option trade entries, their parent/child links, status derivation and
//! realized P&L.
//!
//! # Key Concepts
//!
//! - **Opener**: a Sold/Bought-to-Open trade holding one or more contracts.
//! - **Closing entry**: a child recording that some of the parent's contracts
//!   were bought/sold back, expired, assigned, called away or exercised.
//! - **Closure**: a lot is resolved either on its own record or through
//!   closing entries, never both.

pub mod aggregate;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use aggregate::{
    InlineClose, NewTradeCommand, PatchEffects, ReconstitutedTradeParams, Trade, TradePatch,
};
pub use errors::TradeError;
pub use services::{
    PnlScenario, ReturnMetrics, StatusResolver, TradeChain, TradeGraph, calculate_realized_pnl,
    capital_at_risk, compute_premium, time_based_return,
};
pub use value_objects::{
    CloseMethod, Closure, PositionType, TradeAction, TradeStatus, TradeType,
};
