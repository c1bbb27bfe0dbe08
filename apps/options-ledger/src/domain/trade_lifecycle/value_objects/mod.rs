//! Trade Lifecycle Value Objects

mod close_method;
mod closure;
mod trade_action;
mod trade_status;
mod trade_type;

pub use close_method::CloseMethod;
pub use closure::Closure;
pub use trade_action::TradeAction;
pub use trade_status::TradeStatus;
pub use trade_type::{PositionType, TradeType};
