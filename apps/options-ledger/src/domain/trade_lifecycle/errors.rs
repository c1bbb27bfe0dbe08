//! Trade Lifecycle Errors

use thiserror::Error;

use super::value_objects::{CloseMethod, TradeAction, TradeStatus, TradeType};
use crate::domain::shared::DomainError;

/// Errors raised by trade lifecycle rules.
///
/// Every variant is a validation failure: reported to the caller, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TradeError {
    /// A field value is missing or out of range.
    #[error("Invalid {field}: {message}")]
    InvalidParameters {
        /// Field name.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The close method does not apply to the trade type.
    #[error("Invalid close method '{close_method}' for {trade_type} trades")]
    InvalidCloseMethod {
        /// Type of the trade being closed.
        trade_type: TradeType,
        /// Requested method.
        close_method: CloseMethod,
    },

    /// The close method requires a different opening action.
    #[error("{close_method} is only for trades opened with '{required}'")]
    OpeningActionMismatch {
        /// Requested method.
        close_method: CloseMethod,
        /// Opening action the method requires.
        required: TradeAction,
    },

    /// The trade is not in a state the close workflow starts from.
    #[error(
        "Cannot close this trade. It is already {status}. Only open or assigned trades can be closed."
    )]
    NotCloseable {
        /// Current status.
        status: TradeStatus,
    },

    /// No contracts are left to close.
    #[error("No contracts remaining to close")]
    NothingRemaining,

    /// More contracts requested than remain open.
    #[error("Cannot close {requested} contracts. Only {remaining} contracts remaining open.")]
    QuantityExceedsRemaining {
        /// Contracts requested.
        requested: u32,
        /// Contracts still open.
        remaining: u32,
    },

    /// A priced close was requested without a usable trade price.
    #[error("Trade price greater than 0 is required for {close_method}")]
    MissingPrice {
        /// Requested method.
        close_method: CloseMethod,
    },

    /// No assignment price was supplied and the trade has no strike to fall back on.
    #[error("assignment_price is required for {close_method} when the trade has no strike price")]
    MissingAssignmentPrice {
        /// Requested method.
        close_method: CloseMethod,
    },

    /// A Covered Call operation needs a linked stock position.
    #[error("Covered Call trade must be linked to a stock position")]
    MissingStockPosition,

    /// The trade still has linked child entries.
    #[error("Trade has {count} linked entries; delete those first")]
    HasChildren {
        /// Number of children.
        count: usize,
    },

    /// Shared value-object validation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl TradeError {
    /// Shorthand for [`TradeError::InvalidParameters`].
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
    fn quantity_error_message_names_both_values() {
        let err = TradeError::QuantityExceedsRemaining {
            requested: 3,
            remaining: 1,
        };
        assert_eq!(
            err.to_string(),
            "Cannot close 3 contracts. Only 1 contracts remaining open."
        );
    }

    #[test]
    fn close_method_error_display() {
        let err = TradeError::InvalidCloseMethod {
            trade_type: TradeType::Csp,
            close_method: CloseMethod::CalledAway,
        };
        let msg = err.to_string();
        assert!(msg.contains("called_away"));
        assert!(msg.contains("CSP"));
    }

    #[test]
    fn invalid_shorthand() {
        let err = TradeError::invalid("contract_quantity", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid contract_quantity: must be at least 1"
        );
    }

    #[test]
    fn domain_errors_pass_through() {
        let err: TradeError = DomainError::InvalidValue {
            field: "symbol".to_string(),
            message: "Symbol is required".to_string(),
        }
        .into();
        assert!(err.to_string().contains("Symbol is required"));
    }
}
