//! Update Trade Use Case

use std::sync::Arc;

use crate::application::dto::TradeDto;
use crate::application::ports::{ChangeSet, Clock, LedgerStore};
use crate::domain::shared::{TradeId, UserId};
use crate::domain::stock_ledger::ShareAvailability;
use crate::domain::trade_lifecycle::{
    StatusResolver, Trade, TradeError, TradeGraph, TradePatch, TradeType,
};
use crate::error::LedgerError;

use super::support::{load_graph, log_failure, owned_position, owned_trade};

/// Use case for editing a stored trade.
pub struct UpdateTradeUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> UpdateTradeUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Create a new `UpdateTradeUseCase`.
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Apply a partial update to a trade.
    ///
    /// Absent fields are left alone. Derived values (premium, closing
    /// premium, share reservation, status) are recomputed and the parent of a
    /// closing entry is re-synchronised.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is missing or not owned by the actor, if the
    /// new values fail validation, or if the store rejects the write.
    pub async fn execute(
        &self,
        actor: &UserId,
        id: &TradeId,
        patch: TradePatch,
    ) -> Result<TradeDto, LedgerError> {
        let result = self.update(actor, id, patch).await;
        if let Err(e) = &result {
            log_failure("update_trade", e);
        }
        result
    }

    async fn update(
        &self,
        actor: &UserId,
        id: &TradeId,
        patch: TradePatch,
    ) -> Result<TradeDto, LedgerError> {
        let today = self.clock.today();
        let (mut trade, account) = owned_trade(self.store.as_ref(), actor, id).await?;
        let graph = load_graph(self.store.as_ref(), std::slice::from_ref(account.id())).await?;

        let explicit_status = patch.status;
        let explicit_close_premium = patch.close_premium;
        let effects = trade.apply_patch(patch)?;

        // Closing entries may not take more than their parent leaves open.
        if effects.quantity_changed
            && trade.is_closing_entry()
            && let Some(parent) = graph.parent_of(&trade)
        {
            let remaining = graph.remaining_excluding(parent, trade.id());
            if trade.contract_quantity() > remaining {
                return Err(TradeError::QuantityExceedsRemaining {
                    requested: trade.contract_quantity(),
                    remaining,
                }
                .into());
            }
        }

        if effects.pricing_changed {
            trade.reprice();
        }
        if let Some(premium) = explicit_close_premium {
            trade.set_close_premium(premium);
        } else if effects.close_pricing_changed
            || (effects.quantity_changed && trade.close_price().is_some())
        {
            trade.reprice_close();
        }

        if trade.trade_type() == TradeType::CoveredCall
            && (effects.position_changed || effects.quantity_changed)
        {
            if let Some(position_id) = trade.stock_position_id().cloned() {
                let (position, _) =
                    owned_position(self.store.as_ref(), actor, &position_id).await?;
                ShareAvailability::ensure_link(&position, trade.account_id(), trade.symbol())?;
                if trade.status().is_open() {
                    let others: Vec<Trade> = self
                        .store
                        .find_covered_calls_for_position(&position_id)
                        .await?
                        .into_iter()
                        .filter(|t| t.id() != trade.id())
                        .collect();
                    ShareAvailability::ensure_can_cover(
                        &position,
                        &others,
                        trade.contract_quantity(),
                    )?;
                }
            }
            trade.refresh_share_reservation();
        }

        let status = explicit_status.unwrap_or_else(|| {
            let children: Vec<&Trade> = graph.children_of(trade.id()).collect();
            StatusResolver::resolve(&trade, &children, today)
        });
        trade.set_status(status);

        let mut changes = ChangeSet::new();
        if let Some(parent) = resynced_parent(&graph, &trade) {
            changes.put_trade(parent);
        }
        changes.put_trade(trade.clone());
        self.store.commit(changes).await?;

        tracing::info!(
            trade_id = %trade.id(),
            account_id = %trade.account_id(),
            status = %trade.status(),
            "Trade updated"
        );

        let graph = load_graph(self.store.as_ref(), std::slice::from_ref(account.id())).await?;
        let stored = graph.get(trade.id()).unwrap_or(&trade);
        Ok(TradeDto::from_trade(stored, &graph, today))
    }
}

/// The parent of an edited priced closing leg, with its status recomputed
/// against the edited quantity.
fn resynced_parent(graph: &TradeGraph, edited: &Trade) -> Option<Trade> {
    if !edited.is_priced_closing_leg() {
        return None;
    }
    let mut parent = graph.parent_of(edited)?.clone();
    if parent.status().is_terminal_marker() {
        return None;
    }
    let others: u32 = graph
        .closing_children(parent.id())
        .filter(|c| c.id() != edited.id())
        .map(Trade::contract_quantity)
        .sum();
    let last_close = edited.close_date().unwrap_or(edited.trade_date());
    parent.sync_with_closed_quantity(others + edited.contract_quantity(), last_close);
    Some(parent)
}
