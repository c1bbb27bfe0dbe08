//! Shared fixture for use case tests.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::application::dto::CreateTradeDto;
use crate::application::ports::{ChangeSet, FixedClock, LedgerStore};
use crate::config::LedgerConfig;
use crate::domain::accounts::Account;
use crate::domain::shared::{AccountId, Money, StockPositionId, Symbol, TradeId, UserId};
use crate::domain::stock_ledger::{NewStockPositionCommand, StockPosition};
use crate::domain::trade_lifecycle::{Trade, TradeAction, TradeType};
use crate::infrastructure::persistence::InMemoryLedgerStore;

use super::support::load_graph;
use super::{
    CloseTradeUseCase, CreateTradeUseCase, DeleteTradeUseCase, ManageAccountsUseCase,
    ManageStockPositionsUseCase, QueryTradesUseCase, ReportingUseCase, UpdateTradeUseCase,
};

/// January 2025, day `n`.
pub fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, n).unwrap()
}

/// Store with one account ("acct", owned by "alice") and a clock fixed on day 15.
pub struct Fixture {
    pub store: Arc<InMemoryLedgerStore>,
    pub clock: Arc<FixedClock>,
    pub alice: UserId,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let alice = UserId::new("alice");
        let account = Account::new(
            AccountId::new("acct"),
            alice.clone(),
            "Main",
            Money::new(dec!(10000)),
        )
        .unwrap()
        .with_fees(dec!(0.65), Money::new(dec!(15)))
        .unwrap();
        let mut changes = ChangeSet::new();
        changes.put_account(account);
        store.commit(changes).await.unwrap();
        Self {
            store,
            clock: Arc::new(FixedClock::new(day(15))),
            alice,
        }
    }

    pub fn create_trade(&self) -> CreateTradeUseCase<InMemoryLedgerStore, FixedClock> {
        CreateTradeUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    pub fn update_trade(&self) -> UpdateTradeUseCase<InMemoryLedgerStore, FixedClock> {
        UpdateTradeUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    pub fn close_trade(&self) -> CloseTradeUseCase<InMemoryLedgerStore, FixedClock> {
        CloseTradeUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    pub fn delete_trade(&self) -> DeleteTradeUseCase<InMemoryLedgerStore> {
        DeleteTradeUseCase::new(Arc::clone(&self.store))
    }

    pub fn query_trades(&self) -> QueryTradesUseCase<InMemoryLedgerStore, FixedClock> {
        QueryTradesUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    pub fn stock_positions(&self) -> ManageStockPositionsUseCase<InMemoryLedgerStore> {
        ManageStockPositionsUseCase::new(Arc::clone(&self.store))
    }

    pub fn reporting(&self) -> ReportingUseCase<InMemoryLedgerStore, FixedClock> {
        ReportingUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    pub fn accounts(&self) -> ManageAccountsUseCase<InMemoryLedgerStore> {
        ManageAccountsUseCase::new(Arc::clone(&self.store), LedgerConfig::default())
    }

    pub async fn trade(&self, id: &TradeId) -> Trade {
        self.store.find_trade(id).await.unwrap().unwrap()
    }

    pub async fn children(&self, id: &TradeId) -> Vec<Trade> {
        self.store.find_children(id).await.unwrap()
    }

    pub async fn remaining(&self, id: &TradeId) -> u32 {
        let graph = load_graph(self.store.as_ref(), &[AccountId::new("acct")])
            .await
            .unwrap();
        graph.remaining_open_quantity(graph.get(id).unwrap())
    }

    pub async fn positions(&self) -> Vec<StockPosition> {
        self.store
            .find_positions_by_accounts(&[AccountId::new("acct")])
            .await
            .unwrap()
    }

    /// Lot bought at 150 on day 1.
    pub async fn seed_lot(&self, symbol: &str, shares: u32) -> StockPositionId {
        let position = StockPosition::new(
            StockPositionId::generate(),
            NewStockPositionCommand {
                account_id: AccountId::new("acct"),
                symbol: Symbol::new(symbol),
                shares,
                cost_basis_per_share: dec!(150),
                acquired_date: day(1),
                source_trade_id: None,
                notes: None,
            },
        )
        .unwrap();
        let id = position.id().clone();
        let mut changes = ChangeSet::new();
        changes.put_position(position);
        self.store.commit(changes).await.unwrap();
        id
    }

    /// AAPL 150 put sold at 2.00 on day 2, expiring day 31, no fees.
    pub async fn seed_csp(&self, quantity: u32) -> TradeId {
        self.create_trade()
            .execute(
                &self.alice,
                CreateTradeDto {
                    account_id: "acct".to_string(),
                    symbol: Some("AAPL".to_string()),
                    trade_type: Some(TradeType::Csp),
                    trade_action: Some(TradeAction::SoldToOpen),
                    strike_price: Some(dec!(150)),
                    expiration_date: Some(day(31)),
                    contract_quantity: Some(quantity),
                    trade_price: Some(dec!(2)),
                    fees: Some(dec!(0)),
                    trade_date: Some(day(2)),
                    ..CreateTradeDto::default()
                },
            )
            .await
            .unwrap()
            .trade
            .id()
            .clone()
    }

    /// Store a trade as-is, bypassing the use cases.
    pub async fn put_trade(&self, trade: Trade) {
        let mut changes = ChangeSet::new();
        changes.put_trade(trade);
        self.store.commit(changes).await.unwrap();
    }
}
