//! Reporting DTOs

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Money;

use super::TradeDto;

/// Look-back window for P&L reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    /// Last 365 days.
    Year,
    /// Everything.
    #[default]
    All,
}

impl ReportPeriod {
    /// Earliest trade date included, or None for no bound.
    #[must_use]
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        let days = match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
            Self::All => return None,
        };
        Some(today - Duration::days(days))
    }
}

/// Realized and unrealized P&L over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioPnlDto {
    /// Window the figures cover.
    pub period: ReportPeriod,
    /// Realized P&L of entries traded in the window.
    pub realized_pnl: Money,
    /// Premium still at stake in open contracts.
    pub unrealized_pnl: Money,
    /// Realized plus unrealized.
    pub total_pnl: Money,
    /// Contributed capital plus all-time realized P&L.
    pub total_capital: Money,
    /// Total P&L over total capital, in percent.
    pub rate_of_return_pct: Decimal,
    /// Entries counted.
    pub trade_count: usize,
}

/// Capital at risk in one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntryDto {
    /// Ticker.
    pub symbol: String,
    /// Capital at risk across open contracts.
    pub capital_at_risk: Money,
    /// Share of total capital, in percent.
    pub allocation_pct: Decimal,
    /// Open contracts.
    pub open_contracts: u32,
}

/// Capital at risk by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDto {
    /// Per-symbol entries, largest first.
    pub entries: Vec<AllocationEntryDto>,
    /// Sum of capital at risk.
    pub total_capital_at_risk: Money,
    /// Contributed capital plus all-time realized P&L.
    pub total_capital: Money,
    /// Capital not at risk (zero when there is no capital).
    pub unallocated_capital: Money,
}

/// Everything the binary prints for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountReportDto {
    /// Account ID.
    pub account_id: String,
    /// Account name.
    pub name: String,
    /// Visible trades, newest first.
    pub trades: Vec<TradeDto>,
    /// All-time P&L.
    pub pnl: PortfolioPnlDto,
    /// Open allocation.
    pub allocation: AllocationDto,
}
