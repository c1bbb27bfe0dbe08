//! Stock Ledger Value Objects

mod position_status;

pub use position_status::PositionStatus;
