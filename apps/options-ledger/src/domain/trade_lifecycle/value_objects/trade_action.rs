//! Directional trade actions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The directional action of a priced option entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeAction {
    /// Write an option and collect premium.
    #[serde(rename = "Sold to Open")]
    SoldToOpen,
    /// Buy an option and pay premium.
    #[serde(rename = "Bought to Open")]
    BoughtToOpen,
    /// Buy back a written option.
    #[serde(rename = "Bought to Close")]
    BoughtToClose,
    /// Sell a held option.
    #[serde(rename = "Sold to Close")]
    SoldToClose,
}

impl TradeAction {
    /// Returns true for actions that open a position.
    #[must_use]
    pub const fn is_opening(&self) -> bool {
        matches!(self, Self::SoldToOpen | Self::BoughtToOpen)
    }

    /// Returns true for actions that close a position.
    #[must_use]
    pub const fn is_closing(&self) -> bool {
        matches!(self, Self::BoughtToClose | Self::SoldToClose)
    }

    /// Returns true when cash is received (premium is positive).
    #[must_use]
    pub const fn is_sell(&self) -> bool {
        matches!(self, Self::SoldToOpen | Self::SoldToClose)
    }

    /// The action that closes a position opened with this action.
    #[must_use]
    pub const fn closing_counterpart(&self) -> Option<Self> {
        match self {
            Self::SoldToOpen => Some(Self::BoughtToClose),
            Self::BoughtToOpen => Some(Self::SoldToClose),
            Self::BoughtToClose | Self::SoldToClose => None,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SoldToOpen => "Sold to Open",
            Self::BoughtToOpen => "Bought to Open",
            Self::BoughtToClose => "Bought to Close",
            Self::SoldToClose => "Sold to Close",
        };
        f.write_str(s)
    }
}
