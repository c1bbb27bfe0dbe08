//! Stock Ledger Bounded Context
//!
//! Share lots acquired through assignment, exercise or manual entry, and the
//! shares open covered calls reserve from them.

pub mod aggregate;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use aggregate::{NewStockPositionCommand, StockPosition, StockPositionPatch};
pub use errors::StockPositionError;
pub use services::ShareAvailability;
pub use value_objects::PositionStatus;
