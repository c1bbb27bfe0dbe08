//! Stock Position Aggregate
//!
//! A lot of shares held in an account, created manually or by an assignment /
//! exercise. Shares only ever decrease after creation, as covered calls are
//! called away.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, StockPositionId, Symbol, TradeId, shares_for};
use crate::domain::stock_ledger::errors::StockPositionError;
use crate::domain::stock_ledger::value_objects::PositionStatus;

/// Command to open a share lot.
#[derive(Debug, Clone)]
pub struct NewStockPositionCommand {
    /// Owning account.
    pub account_id: AccountId,
    /// Ticker.
    pub symbol: Symbol,
    /// Number of shares.
    pub shares: u32,
    /// Cost basis per share.
    pub cost_basis_per_share: Decimal,
    /// Acquisition date.
    pub acquired_date: NaiveDate,
    /// Trade that produced the lot.
    pub source_trade_id: Option<TradeId>,
    /// Notes.
    pub notes: Option<String>,
}

impl NewStockPositionCommand {
    /// Command for a lot delivered by `contracts` assigned or exercised contracts.
    #[must_use]
    pub fn from_contracts(
        account_id: AccountId,
        symbol: Symbol,
        contracts: u32,
        cost_basis_per_share: Decimal,
        acquired_date: NaiveDate,
        source_trade_id: TradeId,
    ) -> Self {
        Self {
            account_id,
            symbol,
            shares: shares_for(contracts),
            cost_basis_per_share,
            acquired_date,
            source_trade_id: Some(source_trade_id),
            notes: None,
        }
    }

    /// Validate the command parameters.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is invalid or shares / cost basis are not positive.
    pub fn validate(&self) -> Result<(), StockPositionError> {
        self.symbol.validate()?;
        if self.shares == 0 {
            return Err(StockPositionError::invalid("shares", "must be greater than 0"));
        }
        if self.cost_basis_per_share <= Decimal::ZERO {
            return Err(StockPositionError::invalid(
                "cost_basis_per_share",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Partial update of a share lot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockPositionPatch {
    /// New ticker.
    pub symbol: Option<Symbol>,
    /// New share count.
    pub shares: Option<u32>,
    /// New cost basis per share.
    pub cost_basis_per_share: Option<Decimal>,
    /// New acquisition date.
    pub acquired_date: Option<NaiveDate>,
    /// Explicit status.
    pub status: Option<PositionStatus>,
    /// Replacement notes.
    pub notes: Option<String>,
}

/// A lot of shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPosition {
    id: StockPositionId,
    account_id: AccountId,
    symbol: Symbol,
    shares: u32,
    cost_basis_per_share: Decimal,
    acquired_date: NaiveDate,
    status: PositionStatus,
    source_trade_id: Option<TradeId>,
    notes: Option<String>,
}

impl StockPosition {
    /// Open a new share lot.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails validation.
    pub fn new(
        id: StockPositionId,
        command: NewStockPositionCommand,
    ) -> Result<Self, StockPositionError> {
        command.validate()?;
        Ok(Self {
            id,
            account_id: command.account_id,
            symbol: command.symbol,
            shares: command.shares,
            cost_basis_per_share: command.cost_basis_per_share,
            acquired_date: command.acquired_date,
            status: PositionStatus::Open,
            source_trade_id: command.source_trade_id,
            notes: command.notes,
        })
    }

    /// Reconstitute a lot from stored state.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn reconstitute(
        id: StockPositionId,
        account_id: AccountId,
        symbol: Symbol,
        shares: u32,
        cost_basis_per_share: Decimal,
        acquired_date: NaiveDate,
        status: PositionStatus,
        source_trade_id: Option<TradeId>,
    ) -> Self {
        Self {
            id,
            account_id,
            symbol,
            shares,
            cost_basis_per_share,
            acquired_date,
            status,
            source_trade_id,
            notes: None,
        }
    }

    /// Lot ID.
    #[must_use]
    pub const fn id(&self) -> &StockPositionId {
        &self.id
    }

    /// Owning account.
    #[must_use]
    pub const fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Ticker.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Shares held.
    #[must_use]
    pub const fn shares(&self) -> u32 {
        self.shares
    }

    /// Cost basis per share.
    #[must_use]
    pub const fn cost_basis_per_share(&self) -> Decimal {
        self.cost_basis_per_share
    }

    /// Acquisition date.
    #[must_use]
    pub const fn acquired_date(&self) -> NaiveDate {
        self.acquired_date
    }

    /// Status.
    #[must_use]
    pub const fn status(&self) -> PositionStatus {
        self.status
    }

    /// Trade that produced the lot.
    #[must_use]
    pub const fn source_trade_id(&self) -> Option<&TradeId> {
        self.source_trade_id.as_ref()
    }

    /// Notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Remove shares delivered against an exercised covered call.
    ///
    /// # Errors
    ///
    /// Returns error if the lot holds fewer than `shares` shares.
    pub fn call_away(&mut self, shares: u32) -> Result<(), StockPositionError> {
        if shares > self.shares {
            return Err(StockPositionError::InsufficientShares {
                requested: shares,
                available: self.shares,
            });
        }
        self.shares -= shares;
        if self.shares == 0 {
            self.status = PositionStatus::CalledAway;
        }
        Ok(())
    }

    /// Apply a partial update.
    ///
    /// `reserved` is the number of shares held by open covered calls; the share
    /// count may not drop below it.
    ///
    /// # Errors
    ///
    /// Returns error if a value is invalid or shares would fall below `reserved`.
    pub fn apply_patch(
        &mut self,
        patch: StockPositionPatch,
        reserved: u32,
    ) -> Result<(), StockPositionError> {
        if let Some(shares) = patch.shares
            && reserved > 0
            && shares < reserved
        {
            return Err(StockPositionError::SharesBelowReserved {
                requested: shares,
                reserved,
            });
        }
        if let Some(cost) = patch.cost_basis_per_share
            && cost <= Decimal::ZERO
        {
            return Err(StockPositionError::invalid(
                "cost_basis_per_share",
                "must be greater than 0",
            ));
        }
        if let Some(symbol) = patch.symbol {
            symbol.validate()?;
            self.symbol = symbol;
        }
        if let Some(shares) = patch.shares {
            self.shares = shares;
        }
        if let Some(cost) = patch.cost_basis_per_share {
            self.cost_basis_per_share = cost;
        }
        if let Some(date) = patch.acquired_date {
            self.acquired_date = date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if self.shares == 0 {
            self.status = PositionStatus::CalledAway;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        Ok(())
    }
}
