//! Account Aggregate

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, DomainError, Money, UserId};

/// Direction of an external cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowKind {
    /// Money added to the account.
    Deposit,
    /// Money taken out of the account.
    Withdrawal,
}

/// A deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    /// Direction.
    pub kind: CashFlowKind,
    /// Amount, always positive.
    pub amount: Money,
    /// Date of the movement.
    pub date: NaiveDate,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl CashFlow {
    /// Signed effect on account capital.
    #[must_use]
    pub fn signed(&self) -> Money {
        match self.kind {
            CashFlowKind::Deposit => self.amount,
            CashFlowKind::Withdrawal => -self.amount,
        }
    }
}

/// A brokerage account owned by one user.
///
/// Supplies the fee defaults trades are created with and the capital base
/// returns are measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    owner: UserId,
    name: String,
    #[serde(default)]
    initial_balance: Money,
    #[serde(default)]
    default_fee: Decimal,
    #[serde(default)]
    assignment_fee: Money,
    #[serde(default)]
    cash_flows: Vec<CashFlow>,
}

impl Account {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or a fee or balance is negative.
    pub fn new(
        id: AccountId,
        owner: UserId,
        name: impl Into<String>,
        initial_balance: Money,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidValue {
                field: "name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        initial_balance.ensure_non_negative("initial_balance")?;
        Ok(Self {
            id,
            owner,
            name,
            initial_balance,
            default_fee: Decimal::ZERO,
            assignment_fee: Money::ZERO,
            cash_flows: Vec::new(),
        })
    }

    /// Set the per-contract fee and assignment fee defaults.
    ///
    /// # Errors
    ///
    /// Returns error if either fee is negative.
    pub fn with_fees(mut self, default_fee: Decimal, assignment_fee: Money) -> Result<Self, DomainError> {
        Money::new(default_fee).ensure_non_negative("default_fee")?;
        assignment_fee.ensure_non_negative("assignment_fee")?;
        self.default_fee = default_fee;
        self.assignment_fee = assignment_fee;
        Ok(self)
    }

    /// Account ID.
    #[must_use]
    pub const fn id(&self) -> &AccountId {
        &self.id
    }

    /// Owning user.
    #[must_use]
    pub const fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starting balance.
    #[must_use]
    pub const fn initial_balance(&self) -> Money {
        self.initial_balance
    }

    /// Per-contract fee applied when a trade omits one.
    #[must_use]
    pub const fn default_fee(&self) -> Decimal {
        self.default_fee
    }

    /// Fee charged on assignment or call-away.
    #[must_use]
    pub const fn assignment_fee(&self) -> Money {
        self.assignment_fee
    }

    /// Recorded deposits and withdrawals.
    #[must_use]
    pub fn cash_flows(&self) -> &[CashFlow] {
        &self.cash_flows
    }

    /// Returns true if `user` owns the account.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }

    /// Record a deposit or withdrawal.
    ///
    /// # Errors
    ///
    /// Returns error if the amount is not positive.
    pub fn record_cash_flow(&mut self, flow: CashFlow) -> Result<(), DomainError> {
        if !flow.amount.is_positive() {
            return Err(DomainError::InvalidValue {
                field: "amount".to_string(),
                message: format!("must be greater than 0 (got {})", flow.amount),
            });
        }
        self.cash_flows.push(flow);
        Ok(())
    }

    /// Initial balance plus deposits minus withdrawals.
    #[must_use]
    pub fn contributed_capital(&self) -> Money {
        self.initial_balance + self.cash_flows.iter().map(CashFlow::signed).sum::<Money>()
    }
}
