//! Stock Ledger Aggregates

mod stock_position;

pub use stock_position::{NewStockPositionCommand, StockPosition, StockPositionPatch};
