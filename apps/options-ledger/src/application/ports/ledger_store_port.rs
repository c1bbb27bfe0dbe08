//! Ledger Store Port (Driven Port)
//!
//! Interface for loading and atomically persisting accounts, trades and share
//! lots.

use async_trait::async_trait;

use crate::domain::accounts::Account;
use crate::domain::shared::{AccountId, StockPositionId, TradeId, UserId};
use crate::domain::stock_ledger::StockPosition;
use crate::domain::trade_lifecycle::Trade;

/// Store failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The change set would leave the ledger inconsistent; nothing was written.
    #[error("Ledger consistency check failed: {message}")]
    Consistency {
        /// Which check failed and on what.
        message: String,
    },

    /// The backend could not complete the request.
    #[error("Ledger store error: {message}")]
    Backend {
        /// Backend error description.
        message: String,
    },
}

/// Every write of one logical operation, applied all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Trades to insert or replace.
    pub trades: Vec<Trade>,
    /// Trades to remove.
    pub deleted_trades: Vec<TradeId>,
    /// Share lots to insert or replace.
    pub positions: Vec<StockPosition>,
    /// Share lots to remove.
    pub deleted_positions: Vec<StockPositionId>,
    /// Accounts to insert or replace.
    pub accounts: Vec<Account>,
}

impl ChangeSet {
    /// Create an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a trade.
    pub fn put_trade(&mut self, trade: Trade) -> &mut Self {
        self.trades.retain(|t| t.id() != trade.id());
        self.trades.push(trade);
        self
    }

    /// Remove a trade.
    pub fn delete_trade(&mut self, id: TradeId) -> &mut Self {
        self.deleted_trades.push(id);
        self
    }

    /// Insert or replace a share lot.
    pub fn put_position(&mut self, position: StockPosition) -> &mut Self {
        self.positions.retain(|p| p.id() != position.id());
        self.positions.push(position);
        self
    }

    /// Remove a share lot.
    pub fn delete_position(&mut self, id: StockPositionId) -> &mut Self {
        self.deleted_positions.push(id);
        self
    }

    /// Insert or replace an account.
    pub fn put_account(&mut self, account: Account) -> &mut Self {
        self.accounts.retain(|a| a.id() != account.id());
        self.accounts.push(account);
        self
    }

    /// Returns true if there is nothing to write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
            && self.deleted_trades.is_empty()
            && self.positions.is_empty()
            && self.deleted_positions.is_empty()
            && self.accounts.is_empty()
    }
}

/// Port for ledger persistence.
///
/// Reads always reflect the latest committed change set; callers re-read
/// before validating a mutation.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Find a trade by ID.
    async fn find_trade(&self, id: &TradeId) -> Result<Option<Trade>, StoreError>;

    /// All trades of the given accounts.
    async fn find_trades_by_accounts(
        &self,
        accounts: &[AccountId],
    ) -> Result<Vec<Trade>, StoreError>;

    /// Direct children of a trade.
    async fn find_children(&self, parent: &TradeId) -> Result<Vec<Trade>, StoreError>;

    /// Find a share lot by ID.
    async fn find_stock_position(
        &self,
        id: &StockPositionId,
    ) -> Result<Option<StockPosition>, StoreError>;

    /// All share lots of the given accounts.
    async fn find_positions_by_accounts(
        &self,
        accounts: &[AccountId],
    ) -> Result<Vec<StockPosition>, StoreError>;

    /// Covered calls (any status) written against a share lot.
    async fn find_covered_calls_for_position(
        &self,
        id: &StockPositionId,
    ) -> Result<Vec<Trade>, StoreError>;

    /// Find an account by ID.
    async fn find_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    /// Accounts owned by a user.
    async fn find_accounts_by_owner(&self, owner: &UserId) -> Result<Vec<Account>, StoreError>;

    /// Apply a change set atomically.
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}
