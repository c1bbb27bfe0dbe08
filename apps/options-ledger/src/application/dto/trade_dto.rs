//! Trade DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Money;
use crate::domain::trade_lifecycle::{
    CloseMethod, PositionType, Trade, TradeAction, TradeGraph, TradeStatus, TradeType,
    calculate_realized_pnl, time_based_return,
};

use super::StockPositionDto;

/// DTO for recording a trade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateTradeDto {
    /// Owning account.
    pub account_id: String,
    /// Underlying symbol (copied from the parent for Assignment entries).
    pub symbol: Option<String>,
    /// Strategy type.
    pub trade_type: Option<TradeType>,
    /// Ledger position type; derived when absent.
    pub position_type: Option<PositionType>,
    /// Directional action.
    pub trade_action: Option<TradeAction>,
    /// Strike price.
    pub strike_price: Option<Decimal>,
    /// Expiration date.
    pub expiration_date: Option<NaiveDate>,
    /// Contracts (default 1, or the parent's count for Assignment entries).
    pub contract_quantity: Option<u32>,
    /// Per-share option price.
    pub trade_price: Option<Decimal>,
    /// Per-contract fee (default: the account's default fee).
    pub fees: Option<Decimal>,
    /// Premium used when no price is given.
    pub premium: Option<Decimal>,
    /// Entry date (default: today).
    pub trade_date: Option<NaiveDate>,
    /// Position open date.
    pub open_date: Option<NaiveDate>,
    /// Position close date.
    pub close_date: Option<NaiveDate>,
    /// Assignment price.
    pub assignment_price: Option<Decimal>,
    /// Assignment fee.
    pub assignment_fee: Option<Decimal>,
    /// Explicit status.
    pub status: Option<TradeStatus>,
    /// Parent trade.
    pub parent_trade_id: Option<String>,
    /// Share lot backing a covered call.
    pub stock_position_id: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

/// DTO for the close workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseTradeDto {
    /// How the contracts are resolved.
    pub close_method: CloseMethod,
    /// Close date (default depends on the method).
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    /// Closing price per share (buy/sell-to-close).
    #[serde(default)]
    pub trade_price: Option<Decimal>,
    /// Closing fee per contract (default 0).
    #[serde(default)]
    pub fees: Option<Decimal>,
    /// Contracts to resolve (default: all remaining).
    #[serde(default)]
    pub contract_quantity: Option<u32>,
    /// Price shares move at (default: strike).
    #[serde(default)]
    pub assignment_price: Option<Decimal>,
    /// Assignment fee (default: the account's assignment fee).
    #[serde(default)]
    pub assignment_fee: Option<Decimal>,
    /// Notes appended to the trade.
    #[serde(default)]
    pub notes: Option<String>,
}

impl CloseTradeDto {
    /// Close request with only the method set.
    #[must_use]
    pub const fn new(close_method: CloseMethod) -> Self {
        Self {
            close_method,
            close_date: None,
            trade_price: None,
            fees: None,
            contract_quantity: None,
            assignment_price: None,
            assignment_fee: None,
            notes: None,
        }
    }
}

/// Filters for trade listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeFilterDto {
    /// Restrict to one account.
    pub account_id: Option<String>,
    /// Restrict to one status.
    pub status: Option<TradeStatus>,
    /// Restrict to one symbol.
    pub symbol: Option<String>,
    /// Restrict to one strategy type.
    pub trade_type: Option<TradeType>,
}

/// DTO representing a trade with its derived figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDto {
    /// Stored trade fields.
    #[serde(flatten)]
    pub trade: Trade,
    /// Realized P&L (Assignment entries show the parent put's premium when zero).
    pub realized_pnl: Money,
    /// Days held.
    pub days_held: i64,
    /// Simple return percentage.
    pub simple_return_pct: Option<Decimal>,
    /// Annualized return percentage.
    pub annualized_return_pct: Option<Decimal>,
    /// Capital at risk.
    pub capital_at_risk: Money,
    /// Contracts still open (opening entries only).
    pub remaining_open_quantity: Option<u32>,
}

impl TradeDto {
    /// Create from a trade in `graph`.
    #[must_use]
    pub fn from_trade(trade: &Trade, graph: &TradeGraph, today: NaiveDate) -> Self {
        let realized_pnl = display_realized_pnl(trade, graph);
        let metrics = time_based_return(trade, realized_pnl, today);
        Self {
            trade: trade.clone(),
            realized_pnl,
            days_held: metrics.days_held,
            simple_return_pct: metrics.simple_return_pct,
            annualized_return_pct: metrics.annualized_return_pct,
            capital_at_risk: metrics.capital_at_risk,
            remaining_open_quantity: trade
                .is_opener()
                .then(|| graph.remaining_open_quantity(trade)),
        }
    }
}

/// Realized P&L as shown to users.
///
/// An Assignment entry that realizes nothing shows its parent put's premium.
// TODO: confirm with product whether the zero-to-parent-premium substitution should stay.
#[must_use]
pub fn display_realized_pnl(trade: &Trade, graph: &TradeGraph) -> Money {
    let realized = calculate_realized_pnl(trade, graph);
    if trade.trade_type() != TradeType::Assignment || !realized.is_zero() {
        return realized;
    }
    graph
        .parent_of(trade)
        .filter(|p| p.trade_type() == TradeType::Csp)
        .map_or(realized, Trade::premium)
}

/// A trade with its parent and direct children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeChainDto {
    /// Parent entry.
    pub parent: Option<TradeDto>,
    /// The requested trade.
    pub current: TradeDto,
    /// Direct children.
    pub children: Vec<TradeDto>,
}

/// Result of the close workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseTradeResponseDto {
    /// The resolved trade (full) or the new child entry (partial).
    pub trade: TradeDto,
    /// True when no contracts of the original trade remain open.
    pub is_full: bool,
    /// Share lot created or reduced by the close.
    pub stock_position: Option<StockPositionDto>,
}
