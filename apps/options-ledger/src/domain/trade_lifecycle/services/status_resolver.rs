//! Status Resolver
//!
//! Derives a trade's lifecycle status from its dates, action and children.
//! Pure function over a snapshot; explicit terminal markers are preserved.

use chrono::NaiveDate;

use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::value_objects::{CloseMethod, TradeStatus, TradeType};

/// Status resolution rules, evaluated in priority order.
pub struct StatusResolver;

impl StatusResolver {
    /// Compute the status a trade should carry.
    ///
    /// `children` are the trade's direct children (any kind).
    #[must_use]
    pub fn resolve(trade: &Trade, children: &[&Trade], today: NaiveDate) -> TradeStatus {
        let current = trade.status();

        if current.is_terminal_marker() || trade.close_method() == Some(CloseMethod::CalledAway) {
            return current;
        }
        if trade.close_date().is_some() {
            return TradeStatus::Closed;
        }
        if trade.trade_action().is_some_and(|a| a.is_closing()) {
            return TradeStatus::Closed;
        }
        if trade.trade_type() == TradeType::Assignment {
            return TradeStatus::Assigned;
        }
        if trade.expiration_date().is_some_and(|exp| exp < today) {
            let assigned = children
                .iter()
                .any(|c| c.trade_type() == TradeType::Assignment);
            return if assigned {
                TradeStatus::Assigned
            } else {
                TradeStatus::Closed
            };
        }

        let closed: u32 = children
            .iter()
            .filter(|c| c.is_closing_entry())
            .map(|c| c.contract_quantity())
            .sum();
        let has_closing = children.iter().any(|c| c.is_closing_entry());
        if has_closing {
            if closed >= trade.contract_quantity() {
                return TradeStatus::Closed;
            }
            // A manual Closed without a close date stays Closed.
            if current == TradeStatus::Closed {
                return current;
            }
            return TradeStatus::Open;
        }

        current
    }

    /// Returns true if a listing pass should re-run [`Self::resolve`] on the trade.
    ///
    /// Open trades with contracts left, terminal markers and manually closed
    /// trades without a close date are left alone.
    #[must_use]
    pub fn needs_refresh(trade: &Trade, remaining_open: u32) -> bool {
        let status = trade.status();
        if status == TradeStatus::Open && remaining_open > 0 {
            return false;
        }
        if status.is_terminal_marker() {
            return false;
        }
        !(status == TradeStatus::Closed && trade.close_date().is_none())
    }
}
