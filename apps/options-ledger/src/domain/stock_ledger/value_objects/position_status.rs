//! Share lot status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a share lot still holds shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PositionStatus {
    /// Shares are held.
    #[default]
    Open,
    /// All shares were called away.
    #[serde(rename = "Called Away")]
    CalledAway,
}

impl PositionStatus {
    /// Returns true if the lot still holds shares.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::CalledAway => write!(f, "Called Away"),
        }
    }
}
