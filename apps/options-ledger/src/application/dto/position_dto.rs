//! Stock Position DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::stock_ledger::StockPosition;

/// DTO for opening a share lot manually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStockPositionDto {
    /// Owning account.
    pub account_id: String,
    /// Ticker.
    pub symbol: String,
    /// Shares.
    pub shares: u32,
    /// Cost basis per share.
    pub cost_basis_per_share: Decimal,
    /// Acquisition date.
    pub acquired_date: NaiveDate,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// DTO representing a share lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPositionDto {
    /// Stored lot fields.
    #[serde(flatten)]
    pub position: StockPosition,
    /// Shares not reserved by open covered calls.
    pub available_shares: u32,
}

impl StockPositionDto {
    /// Create from a lot and its free share count.
    #[must_use]
    pub fn new(position: StockPosition, available_shares: u32) -> Self {
        Self {
            position,
            available_shares,
        }
    }
}
