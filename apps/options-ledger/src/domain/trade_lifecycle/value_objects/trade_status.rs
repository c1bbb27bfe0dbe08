//! Trade lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a trade entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Position has contracts still open.
    #[default]
    Open,
    /// Position was closed (bought/sold back, exercised, or expired by date).
    Closed,
    /// Put was assigned, or shares delivered for an Assignment entry.
    Assigned,
    /// Call was exercised against the writer and shares left the account.
    #[serde(rename = "Called Away")]
    CalledAway,
    /// Option expired worthless.
    Expired,
}

impl TradeStatus {
    /// Returns true if the position is still open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Explicit terminal markers that status resolution never recomputes.
    #[must_use]
    pub const fn is_terminal_marker(&self) -> bool {
        matches!(self, Self::Assigned | Self::CalledAway | Self::Expired)
    }

    /// Statuses whose P&L counts as realized in portfolio reports.
    #[must_use]
    pub const fn is_realized(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::Assigned | Self::CalledAway | Self::Expired
        )
    }

    /// Statuses the close workflow accepts as its starting point.
    #[must_use]
    pub const fn is_closeable(&self) -> bool {
        matches!(self, Self::Open | Self::Assigned)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Assigned => "Assigned",
            Self::CalledAway => "Called Away",
            Self::Expired => "Expired",
        };
        f.write_str(s)
    }
}
