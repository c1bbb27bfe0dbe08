//! Trade classification: strategy type and ledger position type.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CloseMethod, TradeAction};

/// The option strategy a trade entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    /// Cash-secured put.
    #[serde(rename = "CSP")]
    Csp,
    /// Call written against shares held in a stock position.
    #[serde(rename = "Covered Call")]
    CoveredCall,
    /// Long-dated long call held as a stock substitute.
    #[serde(rename = "LEAPS")]
    Leaps,
    /// Shares delivered by a put assignment.
    #[serde(rename = "Assignment")]
    Assignment,
}

impl TradeType {
    /// Close methods the close workflow accepts for this trade type.
    #[must_use]
    pub const fn allowed_close_methods(&self) -> &'static [CloseMethod] {
        match self {
            Self::Leaps => &[
                CloseMethod::SellToClose,
                CloseMethod::Expired,
                CloseMethod::Exercise,
            ],
            Self::Csp => &[
                CloseMethod::BuyToClose,
                CloseMethod::Expired,
                CloseMethod::Assigned,
            ],
            Self::CoveredCall => &[
                CloseMethod::BuyToClose,
                CloseMethod::Expired,
                CloseMethod::CalledAway,
            ],
            Self::Assignment => &[],
        }
    }

    /// Returns true if `method` may close a trade of this type.
    #[must_use]
    pub fn allows_close_method(&self, method: CloseMethod) -> bool {
        self.allowed_close_methods().contains(&method)
    }

    /// Display label used in messages and the interchange format.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Csp => "CSP",
            Self::CoveredCall => "Covered Call",
            Self::Leaps => "LEAPS",
            Self::Assignment => "Assignment",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether an entry opens a position, closes one, or records an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionType {
    /// Opening entry.
    Open,
    /// Closing entry (partial or full).
    Close,
    /// Assignment entry.
    Assignment,
}

impl PositionType {
    /// Derive the position type when the caller does not supply one.
    #[must_use]
    pub fn derive(trade_type: TradeType, action: Option<TradeAction>) -> Self {
        if trade_type == TradeType::Assignment {
            return Self::Assignment;
        }
        match action {
            Some(action) if action.is_closing() => Self::Close,
            _ => Self::Open,
        }
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "Open",
            Self::Close => "Close",
            Self::Assignment => "Assignment",
        };
        f.write_str(s)
    }
}
