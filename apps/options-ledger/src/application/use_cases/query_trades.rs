//! Query Trades Use Case
//!
//! Read side of the trade ledger: listings with status refresh, single trades
//! with their derived figures, and parent/child chains.

use std::cmp::Reverse;
use std::sync::Arc;

use crate::application::dto::{TradeChainDto, TradeDto, TradeFilterDto, display_realized_pnl};
use crate::application::ports::{ChangeSet, Clock, LedgerStore};
use crate::domain::shared::{AccountId, Money, Symbol, TradeId, UserId};
use crate::domain::trade_lifecycle::{
    ReturnMetrics, StatusResolver, Trade, TradeGraph, calculate_realized_pnl, time_based_return,
};
use crate::error::{Entity, LedgerError};

use super::support::{load_graph, log_failure, owned_trade, scoped_accounts};

/// Use case for reading trades.
pub struct QueryTradesUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> QueryTradesUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Create a new `QueryTradesUseCase`.
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// List the actor's trades, newest first.
    ///
    /// Statuses that have drifted (expired positions, fully closed parents)
    /// are recomputed and saved first. Priced closing legs are folded into
    /// their parents and not listed.
    ///
    /// # Errors
    ///
    /// Returns error if a requested account is missing or not owned by the
    /// actor, or if the store fails.
    pub async fn list_trades(
        &self,
        actor: &UserId,
        filter: TradeFilterDto,
    ) -> Result<Vec<TradeDto>, LedgerError> {
        let result = self.list(actor, filter).await;
        if let Err(e) = &result {
            log_failure("list_trades", e);
        }
        result
    }

    async fn list(
        &self,
        actor: &UserId,
        filter: TradeFilterDto,
    ) -> Result<Vec<TradeDto>, LedgerError> {
        let today = self.clock.today();
        let requested = filter.account_id.clone().map(AccountId::new);
        let accounts: Vec<AccountId> = scoped_accounts(self.store.as_ref(), actor, requested.as_ref())
            .await?
            .into_iter()
            .map(|a| a.id().clone())
            .collect();

        let mut graph = load_graph(self.store.as_ref(), &accounts).await?;
        let refreshed = refresh_statuses(&graph, today);
        if !refreshed.is_empty() {
            let count = refreshed.trades.len();
            self.store.commit(refreshed).await?;
            tracing::info!(count, "Trade statuses refreshed");
            graph = load_graph(self.store.as_ref(), &accounts).await?;
        }

        let symbol = filter.symbol.map(Symbol::new);
        let mut trades: Vec<&Trade> = graph
            .trades()
            .filter(|t| !t.is_priced_closing_leg())
            .filter(|t| filter.status.is_none_or(|s| t.status() == s))
            .filter(|t| filter.trade_type.is_none_or(|ty| t.trade_type() == ty))
            .filter(|t| symbol.as_ref().is_none_or(|s| t.symbol() == s))
            .collect();
        trades.sort_by_key(|t| (Reverse(t.trade_date()), t.id().clone()));

        Ok(trades
            .into_iter()
            .map(|t| TradeDto::from_trade(t, &graph, today))
            .collect())
    }

    /// A single trade with its derived figures.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is missing or not owned by the actor.
    pub async fn get_trade(&self, actor: &UserId, id: &TradeId) -> Result<TradeDto, LedgerError> {
        let today = self.clock.today();
        let graph = self.graph_for(actor, id).await?;
        let trade = graph
            .get(id)
            .ok_or_else(|| LedgerError::not_found(Entity::Trade, id))?;
        Ok(TradeDto::from_trade(trade, &graph, today))
    }

    /// Realized P&L of a trade, as computed by the engine (no display fallback).
    ///
    /// # Errors
    ///
    /// Returns error if the trade is missing or not owned by the actor.
    pub async fn realized_pnl(&self, actor: &UserId, id: &TradeId) -> Result<Money, LedgerError> {
        let graph = self.graph_for(actor, id).await?;
        let trade = graph
            .get(id)
            .ok_or_else(|| LedgerError::not_found(Entity::Trade, id))?;
        Ok(calculate_realized_pnl(trade, &graph))
    }

    /// Holding period and return figures of a trade.
    ///
    /// Figures are derived from the displayed P&L, so an Assignment entry
    /// reports against its put's premium.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is missing or not owned by the actor.
    pub async fn time_based_return(
        &self,
        actor: &UserId,
        id: &TradeId,
    ) -> Result<ReturnMetrics, LedgerError> {
        let today = self.clock.today();
        let graph = self.graph_for(actor, id).await?;
        let trade = graph
            .get(id)
            .ok_or_else(|| LedgerError::not_found(Entity::Trade, id))?;
        Ok(time_based_return(
            trade,
            display_realized_pnl(trade, &graph),
            today,
        ))
    }

    /// A trade with its parent and direct children.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is missing or not owned by the actor.
    pub async fn trade_chain(
        &self,
        actor: &UserId,
        id: &TradeId,
    ) -> Result<TradeChainDto, LedgerError> {
        let today = self.clock.today();
        let graph = self.graph_for(actor, id).await?;
        let chain = graph
            .trade_chain(id)
            .ok_or_else(|| LedgerError::not_found(Entity::Trade, id))?;
        Ok(TradeChainDto {
            parent: chain
                .parent
                .map(|p| TradeDto::from_trade(p, &graph, today)),
            current: TradeDto::from_trade(chain.current, &graph, today),
            children: chain
                .children
                .iter()
                .filter_map(|c| graph.get(c))
                .map(|c| TradeDto::from_trade(c, &graph, today))
                .collect(),
        })
    }

    async fn graph_for(&self, actor: &UserId, id: &TradeId) -> Result<TradeGraph, LedgerError> {
        let (_, account) = owned_trade(self.store.as_ref(), actor, id).await?;
        load_graph(self.store.as_ref(), std::slice::from_ref(account.id())).await
    }
}

/// Trades whose stored status no longer matches the resolver.
fn refresh_statuses(graph: &TradeGraph, today: chrono::NaiveDate) -> ChangeSet {
    let mut changes = ChangeSet::new();
    for trade in graph.trades() {
        if !StatusResolver::needs_refresh(trade, graph.remaining_open_quantity(trade)) {
            continue;
        }
        let children: Vec<&Trade> = graph.children_of(trade.id()).collect();
        let status = StatusResolver::resolve(trade, &children, today);
        if status != trade.status() {
            let mut updated = trade.clone();
            updated.set_status(status);
            changes.put_trade(updated);
        }
    }
    changes
}
