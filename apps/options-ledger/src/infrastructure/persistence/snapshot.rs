//! JSON snapshot of the whole ledger.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::ports::StoreError;
use crate::domain::accounts::Account;
use crate::domain::stock_ledger::StockPosition;
use crate::domain::trade_lifecycle::Trade;

/// Every account, trade and share lot, in interchange field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Accounts.
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Trades.
    #[serde(default)]
    pub trades: Vec<Trade>,
    /// Share lots.
    #[serde(default)]
    pub stock_positions: Vec<StockPosition>,
}

impl LedgerSnapshot {
    /// Read a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| StoreError::Backend {
            message: format!("failed to read snapshot {}: {e}", path.display()),
        })?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Backend {
            message: format!("failed to parse snapshot {}: {e}", path.display()),
        })
    }

    /// Write the snapshot as pretty-printed JSON, replacing the file.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| StoreError::Backend {
            message: format!("failed to serialize snapshot: {e}"),
        })?;
        std::fs::write(path, json).map_err(|e| StoreError::Backend {
            message: format!("failed to write snapshot {}: {e}", path.display()),
        })
    }
}
