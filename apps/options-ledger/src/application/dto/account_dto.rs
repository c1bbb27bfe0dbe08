//! Account DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::accounts::CashFlowKind;

/// DTO for opening an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountDto {
    /// Display name.
    pub name: String,
    /// Starting balance.
    #[serde(default)]
    pub initial_balance: Decimal,
    /// Per-contract fee default (default: configured ledger fee).
    #[serde(default)]
    pub default_fee: Option<Decimal>,
    /// Assignment fee default (default: configured ledger fee).
    #[serde(default)]
    pub assignment_fee: Option<Decimal>,
}

/// DTO for a deposit or withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowDto {
    /// Direction.
    pub kind: CashFlowKind,
    /// Positive amount.
    pub amount: Decimal,
    /// Date.
    pub date: NaiveDate,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}
