//! In-memory ledger store.
//!
//! Change sets are applied to a copy of the ledger, checked, and swapped in
//! under a single write lock, so a failed check leaves nothing behind.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::application::ports::{ChangeSet, LedgerStore, StoreError};
use crate::domain::accounts::Account;
use crate::domain::shared::{AccountId, StockPositionId, TradeId, UserId};
use crate::domain::stock_ledger::StockPosition;
use crate::domain::trade_lifecycle::{Trade, TradeType};

use super::snapshot::LedgerSnapshot;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    trades: HashMap<TradeId, Trade>,
    positions: HashMap<StockPositionId, StockPosition>,
}

impl LedgerState {
    fn apply(&mut self, changes: ChangeSet) {
        for id in changes.deleted_trades {
            self.trades.remove(&id);
        }
        for id in changes.deleted_positions {
            self.positions.remove(&id);
        }
        for account in changes.accounts {
            self.accounts.insert(account.id().clone(), account);
        }
        for position in changes.positions {
            self.positions.insert(position.id().clone(), position);
        }
        for trade in changes.trades {
            self.trades.insert(trade.id().clone(), trade);
        }
    }

    fn check(
        &self,
        touched_trades: &HashSet<TradeId>,
        touched_positions: &HashSet<StockPositionId>,
    ) -> Result<(), StoreError> {
        for id in touched_trades {
            let Some(trade) = self.trades.get(id) else {
                continue;
            };
            if !self.accounts.contains_key(trade.account_id()) {
                return Err(consistency(format!(
                    "trade {id} references unknown account {}",
                    trade.account_id()
                )));
            }
            if let Some(parent_id) = trade.parent_trade_id() {
                let parent = self.trades.get(parent_id).ok_or_else(|| {
                    consistency(format!("trade {id} references missing parent {parent_id}"))
                })?;
                self.check_closed_quantity(parent)?;
            }
            self.check_closed_quantity(trade)?;
            if trade.trade_type() == TradeType::CoveredCall
                && let Some(position_id) = trade.stock_position_id()
            {
                self.check_covered_call_link(trade, position_id)?;
            }
        }

        let mut sources: HashMap<&TradeId, &StockPositionId> = HashMap::new();
        for position in self.positions.values() {
            if let Some(source) = position.source_trade_id()
                && let Some(existing) = sources.insert(source, position.id())
                && (touched_positions.contains(position.id()) || touched_positions.contains(existing))
            {
                return Err(consistency(format!(
                    "trade {source} already produced stock position {existing}"
                )));
            }
        }
        Ok(())
    }

    fn check_closed_quantity(&self, parent: &Trade) -> Result<(), StoreError> {
        if !parent.is_opener() {
            return Ok(());
        }
        let closed: u32 = self
            .trades
            .values()
            .filter(|t| t.parent_trade_id() == Some(parent.id()) && t.is_closing_entry())
            .map(Trade::contract_quantity)
            .sum();
        if closed > parent.contract_quantity() {
            return Err(consistency(format!(
                "children of trade {} resolve {closed} contracts, trade has {}",
                parent.id(),
                parent.contract_quantity()
            )));
        }
        Ok(())
    }

    fn check_covered_call_link(
        &self,
        trade: &Trade,
        position_id: &StockPositionId,
    ) -> Result<(), StoreError> {
        let position = self.positions.get(position_id).ok_or_else(|| {
            consistency(format!(
                "covered call {} references missing stock position {position_id}",
                trade.id()
            ))
        })?;
        if position.account_id() != trade.account_id() || position.symbol() != trade.symbol() {
            return Err(consistency(format!(
                "covered call {} ({} {}) is linked to stock position {position_id} ({} {})",
                trade.id(),
                trade.account_id(),
                trade.symbol(),
                position.account_id(),
                position.symbol()
            )));
        }
        Ok(())
    }
}

fn consistency(message: String) -> StoreError {
    StoreError::Consistency { message }
}

/// In-memory implementation of [`LedgerStore`].
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the contents of a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let state = LedgerState {
            accounts: snapshot
                .accounts
                .into_iter()
                .map(|a| (a.id().clone(), a))
                .collect(),
            trades: snapshot
                .trades
                .into_iter()
                .map(|t| (t.id().clone(), t))
                .collect(),
            positions: snapshot
                .stock_positions
                .into_iter()
                .map(|p| (p.id().clone(), p))
                .collect(),
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy the current contents, ordered by ID.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.read();
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.id().cmp(b.id()));
        let mut trades: Vec<Trade> = state.trades.values().cloned().collect();
        trades.sort_by(|a, b| a.id().cmp(b.id()));
        let mut stock_positions: Vec<StockPosition> = state.positions.values().cloned().collect();
        stock_positions.sort_by(|a, b| a.id().cmp(b.id()));
        LedgerSnapshot {
            accounts,
            trades,
            stock_positions,
        }
    }

    /// Number of stored trades.
    #[must_use]
    pub fn trade_count(&self) -> usize {
        self.read().trades.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LedgerState> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn find_trade(&self, id: &TradeId) -> Result<Option<Trade>, StoreError> {
        Ok(self.read().trades.get(id).cloned())
    }

    async fn find_trades_by_accounts(
        &self,
        accounts: &[AccountId],
    ) -> Result<Vec<Trade>, StoreError> {
        Ok(self
            .read()
            .trades
            .values()
            .filter(|t| accounts.contains(t.account_id()))
            .cloned()
            .collect())
    }

    async fn find_children(&self, parent: &TradeId) -> Result<Vec<Trade>, StoreError> {
        let mut children: Vec<Trade> = self
            .read()
            .trades
            .values()
            .filter(|t| t.parent_trade_id() == Some(parent))
            .cloned()
            .collect();
        children.sort_by(|a, b| (a.trade_date(), a.id()).cmp(&(b.trade_date(), b.id())));
        Ok(children)
    }

    async fn find_stock_position(
        &self,
        id: &StockPositionId,
    ) -> Result<Option<StockPosition>, StoreError> {
        Ok(self.read().positions.get(id).cloned())
    }

    async fn find_positions_by_accounts(
        &self,
        accounts: &[AccountId],
    ) -> Result<Vec<StockPosition>, StoreError> {
        Ok(self
            .read()
            .positions
            .values()
            .filter(|p| accounts.contains(p.account_id()))
            .cloned()
            .collect())
    }

    async fn find_covered_calls_for_position(
        &self,
        id: &StockPositionId,
    ) -> Result<Vec<Trade>, StoreError> {
        Ok(self
            .read()
            .trades
            .values()
            .filter(|t| t.trade_type() == TradeType::CoveredCall && t.stock_position_id() == Some(id))
            .cloned()
            .collect())
    }

    async fn find_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.read().accounts.get(id).cloned())
    }

    async fn find_accounts_by_owner(&self, owner: &UserId) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self
            .read()
            .accounts
            .values()
            .filter(|a| a.is_owned_by(owner))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(accounts)
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let touched_trades: HashSet<TradeId> =
            changes.trades.iter().map(|t| t.id().clone()).collect();
        let touched_positions: HashSet<StockPositionId> =
            changes.positions.iter().map(|p| p.id().clone()).collect();

        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut next = state.clone();
        next.apply(changes);
        next.check(&touched_trades, &touched_positions)?;
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::{Money, Symbol};
    use crate::domain::stock_ledger::PositionStatus;
    use crate::domain::trade_lifecycle::{ReconstitutedTradeParams, TradeAction, TradeStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn account() -> Account {
        Account::new(
            AccountId::new("acct"),
            UserId::new("alice"),
            "Main",
            Money::new(dec!(10000)),
        )
        .unwrap()
    }

    fn csp(id: &str, quantity: u32) -> Trade {
        Trade::reconstitute(ReconstitutedTradeParams::opening(
            id,
            "acct",
            "AAPL",
            TradeType::Csp,
            TradeAction::SoldToOpen,
            quantity,
            Money::new(dec!(200)),
            date(3),
        ))
    }

    fn btc_child(id: &str, parent: &str, quantity: u32) -> Trade {
        let mut params = ReconstitutedTradeParams::opening(
            id,
            "acct",
            "AAPL",
            TradeType::Csp,
            TradeAction::BoughtToClose,
            quantity,
            Money::new(dec!(-50)),
            date(10),
        );
        params.parent_trade_id = Some(TradeId::new(parent));
        params.status = TradeStatus::Closed;
        Trade::reconstitute(params)
    }

    fn lot(id: &str, symbol: &str, source: Option<&str>) -> StockPosition {
        StockPosition::reconstitute(
            StockPositionId::new(id),
            AccountId::new("acct"),
            Symbol::new(symbol),
            100,
            dec!(150),
            date(1),
            PositionStatus::Open,
            source.map(TradeId::new),
        )
    }

    async fn seeded() -> InMemoryLedgerStore {
        let store = InMemoryLedgerStore::new();
        let mut changes = ChangeSet::new();
        changes.put_account(account()).put_trade(csp("p", 2));
        store.commit(changes).await.unwrap();
        store
    }

    #[tokio::test]
    async fn commit_then_find() {
        let store = seeded().await;
        let found = store.find_trade(&TradeId::new("p")).await.unwrap();
        assert_eq!(found.unwrap().contract_quantity(), 2);
        assert!(store.find_trade(&TradeId::new("x")).await.unwrap().is_none());
        assert_eq!(store.trade_count(), 1);
    }

    #[tokio::test]
    async fn children_come_back_in_date_order() {
        let store = seeded().await;
        let mut params = ReconstitutedTradeParams::opening(
            "c0",
            "acct",
            "AAPL",
            TradeType::Csp,
            TradeAction::BoughtToClose,
            1,
            Money::new(dec!(-50)),
            date(20),
        );
        params.parent_trade_id = Some(TradeId::new("p"));
        let later = Trade::reconstitute(params);
        let earlier = btc_child("c1", "p", 1);
        let mut changes = ChangeSet::new();
        changes.put_trade(later).put_trade(earlier);
        store.commit(changes).await.unwrap();

        let children = store.find_children(&TradeId::new("p")).await.unwrap();
        let ids: Vec<&str> = children.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["c1", "c0"]);
    }

    #[tokio::test]
    async fn over_closing_a_parent_is_rejected_atomically() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes
            .put_trade(btc_child("c1", "p", 2))
            .put_trade(btc_child("c2", "p", 1));
        let err = store.commit(changes).await.unwrap_err();
        assert!(matches!(err, StoreError::Consistency { .. }));
        assert!(store.find_trade(&TradeId::new("c1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_lot_from_same_source_is_rejected() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes.put_position(lot("s1", "AAPL", Some("p")));
        store.commit(changes).await.unwrap();

        let mut changes = ChangeSet::new();
        changes.put_position(lot("s2", "AAPL", Some("p")));
        let err = store.commit(changes).await.unwrap_err();
        assert!(err.to_string().contains("already produced"));

        // Re-saving the same lot is fine.
        let mut changes = ChangeSet::new();
        changes.put_position(lot("s1", "AAPL", Some("p")));
        store.commit(changes).await.unwrap();
    }

    #[tokio::test]
    async fn covered_call_must_match_its_lot() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes.put_position(lot("s1", "MSFT", None));
        store.commit(changes).await.unwrap();

        let mut params = ReconstitutedTradeParams::opening(
            "cc",
            "acct",
            "AAPL",
            TradeType::CoveredCall,
            TradeAction::SoldToOpen,
            1,
            Money::new(dec!(100)),
            date(4),
        );
        params.stock_position_id = Some(StockPositionId::new("s1"));
        let mut changes = ChangeSet::new();
        changes.put_trade(Trade::reconstitute(params));
        let err = store.commit(changes).await.unwrap_err();
        assert!(err.to_string().contains("is linked to stock position"));
    }

    #[tokio::test]
    async fn trades_need_a_known_account() {
        let store = InMemoryLedgerStore::new();
        let mut changes = ChangeSet::new();
        changes.put_trade(csp("p", 1));
        assert!(store.commit(changes).await.is_err());
    }

    #[tokio::test]
    async fn snapshot_round_trip_keeps_contents() {
        let store = seeded().await;
        let restored = InMemoryLedgerStore::from_snapshot(store.snapshot());
        assert_eq!(restored.snapshot(), store.snapshot());
        let accounts = restored
            .find_accounts_by_owner(&UserId::new("alice"))
            .await
            .unwrap();
        assert_eq!(accounts.len(), 1);
    }

    #[tokio::test]
    async fn covered_calls_by_position() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes.put_position(lot("s1", "AAPL", None));
        let mut params = ReconstitutedTradeParams::opening(
            "cc",
            "acct",
            "AAPL",
            TradeType::CoveredCall,
            TradeAction::SoldToOpen,
            1,
            Money::new(dec!(100)),
            date(4),
        );
        params.stock_position_id = Some(StockPositionId::new("s1"));
        changes.put_trade(Trade::reconstitute(params));
        store.commit(changes).await.unwrap();

        let calls = store
            .find_covered_calls_for_position(&StockPositionId::new("s1"))
            .await
            .unwrap();
        assert_eq!(calls.len(), 1);
        let lots = store
            .find_positions_by_accounts(&[AccountId::new("acct")])
            .await
            .unwrap();
        assert_eq!(lots.len(), 1);
    }
}
