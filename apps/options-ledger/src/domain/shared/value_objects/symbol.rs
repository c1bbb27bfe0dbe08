//! Symbol value object for underlying tickers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// An underlying equity ticker (e.g. "AAPL", "BRK.B").
///
/// Options in the ledger are recorded against their underlying symbol with the
/// strike and expiration held separately on the trade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// The symbol is trimmed and normalized to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate the symbol for use on a trade or share lot.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is empty or contains characters other than
    /// ASCII letters, digits, `.` and `-`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol is required".to_string(),
            });
        }
        if !self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: format!("Invalid characters in symbol '{}'", self.0),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_is_normalized() {
        assert_eq!(Symbol::new("  aapl ").as_str(), "AAPL");
    }

    #[test]
    fn symbol_validation() {
        assert!(Symbol::new("BRK.B").validate().is_ok());
        assert!(Symbol::new("").validate().is_err());
        assert!(Symbol::new("AA PL").validate().is_err());
    }
}
