//! Ownership checks and graph loading shared by the use cases.

use crate::application::ports::LedgerStore;
use crate::domain::accounts::Account;
use crate::domain::shared::{AccountId, StockPositionId, TradeId, UserId};
use crate::domain::stock_ledger::StockPosition;
use crate::domain::trade_lifecycle::{Trade, TradeGraph};
use crate::error::{Entity, LedgerError};

/// Load an account the actor owns.
pub(crate) async fn owned_account<S: LedgerStore>(
    store: &S,
    actor: &UserId,
    id: &AccountId,
) -> Result<Account, LedgerError> {
    let account = store
        .find_account(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(Entity::Account, id))?;
    if !account.is_owned_by(actor) {
        return Err(LedgerError::forbidden(Entity::Account, id));
    }
    Ok(account)
}

/// Load a trade in one of the actor's accounts, with that account.
pub(crate) async fn owned_trade<S: LedgerStore>(
    store: &S,
    actor: &UserId,
    id: &TradeId,
) -> Result<(Trade, Account), LedgerError> {
    let trade = store
        .find_trade(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(Entity::Trade, id))?;
    let account = store
        .find_account(trade.account_id())
        .await?
        .filter(|a| a.is_owned_by(actor))
        .ok_or_else(|| LedgerError::forbidden(Entity::Trade, id))?;
    Ok((trade, account))
}

/// Load a share lot in one of the actor's accounts, with that account.
pub(crate) async fn owned_position<S: LedgerStore>(
    store: &S,
    actor: &UserId,
    id: &StockPositionId,
) -> Result<(StockPosition, Account), LedgerError> {
    let position = store
        .find_stock_position(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(Entity::StockPosition, id))?;
    let account = store
        .find_account(position.account_id())
        .await?
        .filter(|a| a.is_owned_by(actor))
        .ok_or_else(|| LedgerError::forbidden(Entity::StockPosition, id))?;
    Ok((position, account))
}

/// The requested account, or every account the actor owns.
pub(crate) async fn scoped_accounts<S: LedgerStore>(
    store: &S,
    actor: &UserId,
    account_id: Option<&AccountId>,
) -> Result<Vec<Account>, LedgerError> {
    match account_id {
        Some(id) => Ok(vec![owned_account(store, actor, id).await?]),
        None => Ok(store.find_accounts_by_owner(actor).await?),
    }
}

/// Build a trade graph over the given accounts, with share lot cost basis.
pub(crate) async fn load_graph<S: LedgerStore>(
    store: &S,
    accounts: &[AccountId],
) -> Result<TradeGraph, LedgerError> {
    let trades = store.find_trades_by_accounts(accounts).await?;
    let positions = store.find_positions_by_accounts(accounts).await?;
    Ok(TradeGraph::new(trades).with_cost_basis(
        positions
            .into_iter()
            .map(|p| (p.id().clone(), p.cost_basis_per_share())),
    ))
}

/// Log a failed operation at a level matching its category.
pub(crate) fn log_failure(operation: &str, err: &LedgerError) {
    match err {
        LedgerError::Storage { .. } => {
            tracing::error!(operation, code = %err.code(), "Ledger operation failed: {}", err);
        }
        _ => {
            tracing::warn!(operation, code = %err.code(), "Ledger operation rejected: {}", err);
        }
    }
}
