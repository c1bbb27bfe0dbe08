//! Stock Ledger Errors

use thiserror::Error;

use super::value_objects::PositionStatus;
use crate::domain::shared::DomainError;

/// Errors raised by share lot rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockPositionError {
    /// A field value is missing or out of range.
    #[error("Invalid {field}: {message}")]
    InvalidParameters {
        /// Field name.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Not enough unreserved shares for a new covered call or a call-away.
    #[error("Not enough shares available. Need {requested}, only {available} available.")]
    InsufficientShares {
        /// Shares requested.
        requested: u32,
        /// Shares available.
        available: u32,
    },

    /// Shares cannot drop below what open covered calls reserve.
    #[error(
        "Cannot reduce shares to {requested}. {reserved} shares are currently used by active covered calls."
    )]
    SharesBelowReserved {
        /// New share count.
        requested: u32,
        /// Shares reserved by open covered calls.
        reserved: u32,
    },

    /// The lot still backs open covered calls.
    #[error(
        "Cannot delete position. It has {count} active covered call(s). Close or delete those trades first."
    )]
    ActiveCoveredCalls {
        /// Open covered calls referencing the lot.
        count: usize,
    },

    /// The lot no longer holds shares.
    #[error("Stock position is {status}")]
    NotOpen {
        /// Current status.
        status: PositionStatus,
    },

    /// A covered call and its lot disagree on account or symbol.
    #[error("Stock position {field} does not match the trade: {message}")]
    LinkMismatch {
        /// Mismatched field (`account_id` or `symbol`).
        field: String,
        /// Both values.
        message: String,
    },

    /// Shared value-object validation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl StockPositionError {
    /// Shorthand for [`StockPositionError::InvalidParameters`].
    #[must_use]
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_numbers() {
        let msg = StockPositionError::SharesBelowReserved {
            requested: 100,
            reserved: 200,
        }
        .to_string();
        assert!(msg.contains("Cannot reduce shares to 100"));
        assert!(msg.contains("200 shares"));

        let msg = StockPositionError::ActiveCoveredCalls { count: 2 }.to_string();
        assert!(msg.contains("2 active covered call(s)"));

        let msg = StockPositionError::InsufficientShares {
            requested: 300,
            available: 100,
        }
        .to_string();
        assert!(msg.contains("Need 300"));
    }
}
