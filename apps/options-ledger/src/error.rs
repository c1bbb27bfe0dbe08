//! Error handling for the options ledger.
//!
//! Every failure a use case reports is a [`LedgerError`]. Variants keep the
//! caller-facing categories distinct so an HTTP layer can map them without
//! inspecting messages.
//!
//! # Status Mapping
//!
//! | Category | HTTP | Usage |
//! |----------|------|-------|
//! | Validation | 400 | Bad input, rule violated before any write |
//! | Forbidden | 403 | Entity exists but belongs to another user |
//! | NotFound | 404 | Entity does not exist |
//! | Consistency | 409 | Store rejected a change set |
//! | Storage | 500 | Backend failure |

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::StoreError;
use crate::domain::shared::DomainError;
use crate::domain::stock_ledger::StockPositionError;
use crate::domain::trade_lifecycle::TradeError;

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (400)
    /// Invalid or missing field.
    InvalidRequest,
    /// Close method not allowed for the trade.
    InvalidCloseMethod,
    /// More contracts requested than remain open.
    QuantityExceedsRemaining,
    /// Not enough unreserved shares.
    InsufficientShares,
    /// Operation blocked by linked entries (children or covered calls).
    HasLinkedEntries,

    // Authorization (403)
    /// Entity belongs to another user.
    Forbidden,

    // Not found (404)
    /// Trade not found.
    TradeNotFound,
    /// Stock position not found.
    StockPositionNotFound,
    /// Account not found.
    AccountNotFound,

    // Conflict (409)
    /// Store consistency check failed.
    ConsistencyViolation,

    // Internal (500)
    /// Storage backend error.
    StorageError,
}

impl ErrorCode {
    /// HTTP status number for this code.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest
            | Self::InvalidCloseMethod
            | Self::QuantityExceedsRemaining
            | Self::InsufficientShares
            | Self::HasLinkedEntries => 400,
            Self::Forbidden => 403,
            Self::TradeNotFound | Self::StockPositionNotFound | Self::AccountNotFound => 404,
            Self::ConsistencyViolation => 409,
            Self::StorageError => 500,
        }
    }

    /// Reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidCloseMethod => "INVALID_CLOSE_METHOD",
            Self::QuantityExceedsRemaining => "QUANTITY_EXCEEDS_REMAINING",
            Self::InsufficientShares => "INSUFFICIENT_SHARES",
            Self::HasLinkedEntries => "HAS_LINKED_ENTRIES",
            Self::Forbidden => "FORBIDDEN",
            Self::TradeNotFound => "TRADE_NOT_FOUND",
            Self::StockPositionNotFound => "STOCK_POSITION_NOT_FOUND",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::ConsistencyViolation => "CONSISTENCY_VIOLATION",
            Self::StorageError => "STORAGE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Kind of entity a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    /// Trade entry.
    Trade,
    /// Share lot.
    StockPosition,
    /// Account.
    Account,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trade => write!(f, "Trade"),
            Self::StockPosition => write!(f, "Stock position"),
            Self::Account => write!(f, "Account"),
        }
    }
}

/// Input rejected by a domain rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Trade lifecycle rule.
    #[error(transparent)]
    Trade(#[from] TradeError),
    /// Share lot rule.
    #[error(transparent)]
    StockPosition(#[from] StockPositionError),
    /// Shared value rule.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Error returned by ledger use cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Input invalid; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind.
        entity: Entity,
        /// Requested ID.
        id: String,
    },

    /// Referenced entity exists but the actor does not own it.
    #[error("{entity} {id} is not accessible to this user")]
    Forbidden {
        /// Entity kind.
        entity: Entity,
        /// Requested ID.
        id: String,
    },

    /// The change would leave the ledger inconsistent.
    #[error("Consistency violation: {message}")]
    Consistency {
        /// What was violated.
        message: String,
    },

    /// Storage failure.
    #[error("Storage error: {message}")]
    Storage {
        /// Backend error description.
        message: String,
    },
}

impl LedgerError {
    /// Not-found error for an entity.
    #[must_use]
    pub fn not_found(entity: Entity, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Forbidden error for an entity.
    #[must_use]
    pub fn forbidden(entity: Entity, id: impl fmt::Display) -> Self {
        Self::Forbidden {
            entity,
            id: id.to_string(),
        }
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(v) => match v {
                ValidationError::Trade(
                    TradeError::InvalidCloseMethod { .. } | TradeError::OpeningActionMismatch { .. },
                ) => ErrorCode::InvalidCloseMethod,
                ValidationError::Trade(
                    TradeError::QuantityExceedsRemaining { .. } | TradeError::NothingRemaining,
                ) => ErrorCode::QuantityExceedsRemaining,
                ValidationError::Trade(TradeError::HasChildren { .. })
                | ValidationError::StockPosition(
                    StockPositionError::ActiveCoveredCalls { .. }
                    | StockPositionError::SharesBelowReserved { .. },
                ) => ErrorCode::HasLinkedEntries,
                ValidationError::StockPosition(StockPositionError::InsufficientShares { .. }) => {
                    ErrorCode::InsufficientShares
                }
                _ => ErrorCode::InvalidRequest,
            },
            Self::NotFound { entity, .. } => match entity {
                Entity::Trade => ErrorCode::TradeNotFound,
                Entity::StockPosition => ErrorCode::StockPositionNotFound,
                Entity::Account => ErrorCode::AccountNotFound,
            },
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::Consistency { .. } => ErrorCode::ConsistencyViolation,
            Self::Storage { .. } => ErrorCode::StorageError,
        }
    }

    /// Returns true for input errors the caller can fix.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Convert to an HTTP-compatible error response.
    #[must_use]
    pub fn to_http_response(&self) -> HttpErrorResponse {
        let mut details = HashMap::new();
        match self {
            Self::NotFound { entity, id } | Self::Forbidden { entity, id } => {
                details.insert("entity".to_string(), entity.to_string());
                details.insert("id".to_string(), id.clone());
            }
            Self::Validation(ValidationError::Trade(TradeError::InvalidParameters {
                field, ..
            }))
            | Self::Validation(ValidationError::StockPosition(
                StockPositionError::InvalidParameters { field, .. },
            ))
            | Self::Validation(ValidationError::Domain(DomainError::InvalidValue {
                field, ..
            })) => {
                details.insert("field".to_string(), field.clone());
            }
            _ => {}
        }
        let code = self.code();
        HttpErrorResponse {
            code: code.reason().to_string(),
            message: self.to_string(),
            status: code.http_status(),
            details,
        }
    }
}

impl From<TradeError> for LedgerError {
    fn from(err: TradeError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<StockPositionError> for LedgerError {
    fn from(err: StockPositionError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<DomainError> for LedgerError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Consistency { message } => Self::Consistency { message },
            StoreError::Backend { message } => Self::Storage { message },
        }
    }
}

/// HTTP-compatible error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error code string.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// HTTP status number.
    pub status: u16,
    /// Additional details.
    pub details: HashMap<String, String>,
}
