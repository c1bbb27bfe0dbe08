//! Trade Lifecycle Domain Services
//!
//! Pure business rules over trades and their relationships.

mod premium;
mod realized_pnl;
mod status_resolver;
mod time_based_return;
mod trade_graph;

pub use premium::compute_premium;
pub use realized_pnl::{PnlScenario, calculate_realized_pnl};
pub use status_resolver::StatusResolver;
pub use time_based_return::{ReturnMetrics, capital_at_risk, close_effective_date, time_based_return};
pub use trade_graph::{TradeChain, TradeGraph};
