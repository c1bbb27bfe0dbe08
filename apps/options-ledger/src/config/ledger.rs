//! Ledger defaults applied to new accounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fee defaults for accounts opened without their own.
///
/// The contract multiplier is fixed at 100 shares and not configurable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Per-contract fee.
    #[serde(default)]
    pub default_fee: Decimal,
    /// Flat fee charged on assignment or call-away.
    #[serde(default)]
    pub assignment_fee: Decimal,
}
