//! Delete Trade Use Case

use std::sync::Arc;

use crate::application::ports::{ChangeSet, LedgerStore};
use crate::domain::shared::{TradeId, UserId};
use crate::domain::trade_lifecycle::TradeError;
use crate::error::LedgerError;

use super::support::{log_failure, owned_trade};

/// Use case for removing a trade entry.
pub struct DeleteTradeUseCase<S>
where
    S: LedgerStore,
{
    store: Arc<S>,
}

impl<S> DeleteTradeUseCase<S>
where
    S: LedgerStore,
{
    /// Create a new `DeleteTradeUseCase`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Delete a trade that has no child entries.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is missing, not owned by the actor, or
    /// still has children.
    pub async fn execute(&self, actor: &UserId, id: &TradeId) -> Result<(), LedgerError> {
        let result = self.delete(actor, id).await;
        if let Err(e) = &result {
            log_failure("delete_trade", e);
        }
        result
    }

    async fn delete(&self, actor: &UserId, id: &TradeId) -> Result<(), LedgerError> {
        let (trade, _) = owned_trade(self.store.as_ref(), actor, id).await?;
        let children = self.store.find_children(id).await?;
        if !children.is_empty() {
            return Err(TradeError::HasChildren {
                count: children.len(),
            }
            .into());
        }

        let mut changes = ChangeSet::new();
        changes.delete_trade(id.clone());
        self.store.commit(changes).await?;
        tracing::info!(trade_id = %id, account_id = %trade.account_id(), "Trade deleted");
        Ok(())
    }
}
