//! Share availability
//!
//! Shares of a lot not reserved by open covered calls.

use crate::domain::shared::{AccountId, Symbol, shares_for};
use crate::domain::stock_ledger::aggregate::StockPosition;
use crate::domain::stock_ledger::errors::StockPositionError;
use crate::domain::trade_lifecycle::Trade;

/// Reservation rules for share lots.
pub struct ShareAvailability;

impl ShareAvailability {
    /// Open covered calls written against the lot.
    pub fn active_covered_calls<'a>(
        position: &'a StockPosition,
        trades: impl IntoIterator<Item = &'a Trade> + 'a,
    ) -> impl Iterator<Item = &'a Trade> + 'a {
        trades.into_iter().filter(move |t| {
            t.stock_position_id() == Some(position.id()) && t.reserved_shares() > 0
        })
    }

    /// Shares reserved by open covered calls.
    pub fn reserved<'a>(
        position: &'a StockPosition,
        trades: impl IntoIterator<Item = &'a Trade> + 'a,
    ) -> u32 {
        Self::active_covered_calls(position, trades)
            .map(Trade::reserved_shares)
            .sum()
    }

    /// Shares still free to back a new covered call. Never negative.
    pub fn available<'a>(
        position: &'a StockPosition,
        trades: impl IntoIterator<Item = &'a Trade> + 'a,
    ) -> u32 {
        position
            .shares()
            .saturating_sub(Self::reserved(position, trades))
    }

    /// Check that the lot sits in the trade's account and underlying.
    ///
    /// # Errors
    ///
    /// Returns error naming the mismatched field.
    pub fn ensure_link(
        position: &StockPosition,
        account_id: &AccountId,
        symbol: &Symbol,
    ) -> Result<(), StockPositionError> {
        if position.account_id() != account_id {
            return Err(StockPositionError::LinkMismatch {
                field: "account_id".to_string(),
                message: format!("lot is in {}, trade is in {account_id}", position.account_id()),
            });
        }
        if position.symbol() != symbol {
            return Err(StockPositionError::LinkMismatch {
                field: "symbol".to_string(),
                message: format!("lot holds {}, trade is on {symbol}", position.symbol()),
            });
        }
        Ok(())
    }

    /// Check that a covered call of `contracts` contracts can be written.
    ///
    /// # Errors
    ///
    /// Returns error if the lot is not open or lacks enough free shares.
    pub fn ensure_can_cover<'a>(
        position: &'a StockPosition,
        trades: impl IntoIterator<Item = &'a Trade> + 'a,
        contracts: u32,
    ) -> Result<(), StockPositionError> {
        if !position.status().is_open() {
            return Err(StockPositionError::NotOpen {
                status: position.status(),
            });
        }
        let requested = shares_for(contracts);
        let available = Self::available(position, trades);
        if requested > available {
            return Err(StockPositionError::InsufficientShares {
                requested,
                available,
            });
        }
        Ok(())
    }
}
