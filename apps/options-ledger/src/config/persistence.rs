//! Ledger persistence configuration.

use serde::{Deserialize, Serialize};

/// Where the ledger is loaded from and saved to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// JSON snapshot imported at start-up, if any.
    #[serde(default)]
    pub snapshot_path: Option<String>,
    /// Write the ledger back to `snapshot_path` on exit.
    #[serde(default = "default_save_on_exit")]
    pub save_on_exit: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            save_on_exit: default_save_on_exit(),
        }
    }
}

impl PersistenceConfig {
    /// Snapshot path to write on exit, when saving is enabled.
    #[must_use]
    pub fn save_target(&self) -> Option<&str> {
        self.snapshot_path
            .as_deref()
            .filter(|p| self.save_on_exit && !p.trim().is_empty())
    }
}

const fn default_save_on_exit() -> bool {
    true
}
