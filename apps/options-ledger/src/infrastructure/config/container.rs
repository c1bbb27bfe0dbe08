//! Dependency Injection Container
//!
//! Manages creation and wiring of all application components.

use std::sync::Arc;

use crate::application::ports::{Clock, LedgerStore, SystemClock};
use crate::application::use_cases::{
    CloseTradeUseCase, CreateTradeUseCase, DeleteTradeUseCase, ManageAccountsUseCase,
    ManageStockPositionsUseCase, QueryTradesUseCase, ReportingUseCase, UpdateTradeUseCase,
};
use crate::config::LedgerConfig;
use crate::infrastructure::persistence::InMemoryLedgerStore;

/// Dependency injection container.
///
/// Holds the store, the clock and the ledger defaults; every use case it
/// hands out shares the same store.
pub struct Container<S, C>
where
    S: LedgerStore + 'static,
    C: Clock + 'static,
{
    store: Arc<S>,
    clock: Arc<C>,
    ledger: LedgerConfig,
}

impl Container<InMemoryLedgerStore, SystemClock> {
    /// Container over an in-memory store and the wall clock.
    pub fn in_memory(store: InMemoryLedgerStore, ledger: LedgerConfig) -> Self {
        Self::new(Arc::new(store), Arc::new(SystemClock), ledger)
    }
}

impl<S, C> Container<S, C>
where
    S: LedgerStore + 'static,
    C: Clock + 'static,
{
    /// Create a new container with all dependencies.
    pub const fn new(store: Arc<S>, clock: Arc<C>, ledger: LedgerConfig) -> Self {
        Self {
            store,
            clock,
            ledger,
        }
    }

    /// Get the ledger store.
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// Get the clock.
    pub fn clock(&self) -> Arc<C> {
        Arc::clone(&self.clock)
    }

    /// Create a `CreateTradeUseCase`.
    pub fn create_trade_use_case(&self) -> CreateTradeUseCase<S, C> {
        CreateTradeUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    /// Create an `UpdateTradeUseCase`.
    pub fn update_trade_use_case(&self) -> UpdateTradeUseCase<S, C> {
        UpdateTradeUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    /// Create a `CloseTradeUseCase`.
    pub fn close_trade_use_case(&self) -> CloseTradeUseCase<S, C> {
        CloseTradeUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    /// Create a `DeleteTradeUseCase`.
    pub fn delete_trade_use_case(&self) -> DeleteTradeUseCase<S> {
        DeleteTradeUseCase::new(Arc::clone(&self.store))
    }

    /// Create a `QueryTradesUseCase`.
    pub fn query_trades_use_case(&self) -> QueryTradesUseCase<S, C> {
        QueryTradesUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    /// Create a `ManageStockPositionsUseCase`.
    pub fn stock_positions_use_case(&self) -> ManageStockPositionsUseCase<S> {
        ManageStockPositionsUseCase::new(Arc::clone(&self.store))
    }

    /// Create a `ManageAccountsUseCase`.
    pub fn accounts_use_case(&self) -> ManageAccountsUseCase<S> {
        ManageAccountsUseCase::new(Arc::clone(&self.store), self.ledger.clone())
    }

    /// Create a `ReportingUseCase`.
    pub fn reporting_use_case(&self) -> ReportingUseCase<S, C> {
        ReportingUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }
}
