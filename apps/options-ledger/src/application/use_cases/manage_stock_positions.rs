//! Manage Stock Positions Use Case

use std::sync::Arc;

use crate::application::dto::{CreateStockPositionDto, StockPositionDto};
use crate::application::ports::{ChangeSet, LedgerStore};
use crate::domain::shared::{AccountId, StockPositionId, Symbol, UserId};
use crate::domain::stock_ledger::{
    NewStockPositionCommand, ShareAvailability, StockPosition, StockPositionError,
    StockPositionPatch,
};
use crate::error::LedgerError;

use super::support::{log_failure, owned_account, owned_position, scoped_accounts};

/// Use case for share lots.
pub struct ManageStockPositionsUseCase<S>
where
    S: LedgerStore,
{
    store: Arc<S>,
}

impl<S> ManageStockPositionsUseCase<S>
where
    S: LedgerStore,
{
    /// Create a new `ManageStockPositionsUseCase`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Open a share lot by hand.
    ///
    /// # Errors
    ///
    /// Returns error if the account is missing or not owned by the actor, or
    /// if shares or cost basis are not positive.
    pub async fn create_stock_position(
        &self,
        actor: &UserId,
        request: CreateStockPositionDto,
    ) -> Result<StockPositionDto, LedgerError> {
        let result = self.create(actor, request).await;
        if let Err(e) = &result {
            log_failure("create_stock_position", e);
        }
        result
    }

    async fn create(
        &self,
        actor: &UserId,
        request: CreateStockPositionDto,
    ) -> Result<StockPositionDto, LedgerError> {
        let account_id = AccountId::new(request.account_id);
        owned_account(self.store.as_ref(), actor, &account_id).await?;
        let command = NewStockPositionCommand {
            account_id,
            symbol: Symbol::new(request.symbol),
            shares: request.shares,
            cost_basis_per_share: request.cost_basis_per_share,
            acquired_date: request.acquired_date,
            source_trade_id: None,
            notes: request.notes,
        };
        let position = StockPosition::new(StockPositionId::generate(), command)?;
        let mut changes = ChangeSet::new();
        changes.put_position(position.clone());
        self.store.commit(changes).await?;
        tracing::info!(
            position_id = %position.id(),
            symbol = %position.symbol(),
            shares = position.shares(),
            "Stock position opened"
        );
        let available = position.shares();
        Ok(StockPositionDto::new(position, available))
    }

    /// Edit a share lot.
    ///
    /// # Errors
    ///
    /// Returns error if the lot is missing or not owned by the actor, if the
    /// share count would drop below what open covered calls reserve, or if
    /// the symbol changes while covered calls reference the lot.
    pub async fn update_stock_position(
        &self,
        actor: &UserId,
        id: &StockPositionId,
        patch: StockPositionPatch,
    ) -> Result<StockPositionDto, LedgerError> {
        let result = self.update(actor, id, patch).await;
        if let Err(e) = &result {
            log_failure("update_stock_position", e);
        }
        result
    }

    async fn update(
        &self,
        actor: &UserId,
        id: &StockPositionId,
        patch: StockPositionPatch,
    ) -> Result<StockPositionDto, LedgerError> {
        let (mut position, _) = owned_position(self.store.as_ref(), actor, id).await?;
        let calls = self.store.find_covered_calls_for_position(id).await?;
        if let Some(symbol) = &patch.symbol
            && symbol != position.symbol()
            && !calls.is_empty()
        {
            return Err(StockPositionError::LinkMismatch {
                field: "symbol".to_string(),
                message: format!(
                    "{} covered call(s) are written on {}",
                    calls.len(),
                    position.symbol()
                ),
            }
            .into());
        }
        let reserved = ShareAvailability::reserved(&position, &calls);
        position.apply_patch(patch, reserved)?;

        let mut changes = ChangeSet::new();
        changes.put_position(position.clone());
        self.store.commit(changes).await?;
        tracing::info!(
            position_id = %id,
            shares = position.shares(),
            status = %position.status(),
            "Stock position updated"
        );
        let available = ShareAvailability::available(&position, &calls);
        Ok(StockPositionDto::new(position, available))
    }

    /// Delete a share lot no open covered call depends on.
    ///
    /// # Errors
    ///
    /// Returns error if the lot is missing, not owned by the actor, or backs
    /// open covered calls.
    pub async fn delete_stock_position(
        &self,
        actor: &UserId,
        id: &StockPositionId,
    ) -> Result<(), LedgerError> {
        let result = self.delete(actor, id).await;
        if let Err(e) = &result {
            log_failure("delete_stock_position", e);
        }
        result
    }

    async fn delete(
        &self,
        actor: &UserId,
        id: &StockPositionId,
    ) -> Result<(), LedgerError> {
        let (position, _) = owned_position(self.store.as_ref(), actor, id).await?;
        let calls = self.store.find_covered_calls_for_position(id).await?;
        let active = calls.iter().filter(|t| t.status().is_open()).count();
        if active > 0 {
            return Err(StockPositionError::ActiveCoveredCalls { count: active }.into());
        }
        let mut changes = ChangeSet::new();
        changes.delete_position(id.clone());
        self.store.commit(changes).await?;
        tracing::info!(position_id = %id, symbol = %position.symbol(), "Stock position deleted");
        Ok(())
    }

    /// Open lots with free shares, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the account is missing or not owned by the actor.
    pub async fn list_available_positions(
        &self,
        actor: &UserId,
        account_id: &AccountId,
        symbol: Option<&str>,
    ) -> Result<Vec<StockPositionDto>, LedgerError> {
        owned_account(self.store.as_ref(), actor, account_id).await?;
        let symbol = symbol.map(Symbol::new);
        let mut available = Vec::new();
        for dto in self.with_availability(std::slice::from_ref(account_id)).await? {
            let wanted = symbol.as_ref().is_none_or(|s| dto.position.symbol() == s);
            if wanted && dto.position.status().is_open() && dto.available_shares > 0 {
                available.push(dto);
            }
        }
        available.sort_by(|a, b| {
            (a.position.acquired_date(), a.position.id())
                .cmp(&(b.position.acquired_date(), b.position.id()))
        });
        Ok(available)
    }

    /// Every lot in the actor's accounts (or one account), oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if a requested account is missing or not owned by the actor.
    pub async fn list_positions(
        &self,
        actor: &UserId,
        account_id: Option<&AccountId>,
    ) -> Result<Vec<StockPositionDto>, LedgerError> {
        let accounts: Vec<AccountId> = scoped_accounts(self.store.as_ref(), actor, account_id)
            .await?
            .into_iter()
            .map(|a| a.id().clone())
            .collect();
        let mut positions = self.with_availability(&accounts).await?;
        positions.sort_by(|a, b| {
            (a.position.acquired_date(), a.position.id())
                .cmp(&(b.position.acquired_date(), b.position.id()))
        });
        Ok(positions)
    }

    /// Shares of a lot not reserved by open covered calls.
    ///
    /// # Errors
    ///
    /// Returns error if the lot is missing or not owned by the actor.
    pub async fn get_available_shares(
        &self,
        actor: &UserId,
        id: &StockPositionId,
    ) -> Result<u32, LedgerError> {
        let (position, _) = owned_position(self.store.as_ref(), actor, id).await?;
        let calls = self.store.find_covered_calls_for_position(id).await?;
        Ok(ShareAvailability::available(&position, &calls))
    }

    async fn with_availability(
        &self,
        accounts: &[AccountId],
    ) -> Result<Vec<StockPositionDto>, LedgerError> {
        let positions = self.store.find_positions_by_accounts(accounts).await?;
        let trades = self.store.find_trades_by_accounts(accounts).await?;
        Ok(positions
            .into_iter()
            .map(|p| {
                let available = ShareAvailability::available(&p, &trades);
                StockPositionDto::new(p, available)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::{CloseTradeDto, CreateTradeDto};
    use crate::application::use_cases::test_support::{Fixture, day};
    use crate::domain::stock_ledger::PositionStatus;
    use crate::domain::trade_lifecycle::{CloseMethod, TradeAction, TradeType};
    use crate::error::ErrorCode;
    use rust_decimal_macros::dec;

    fn lot_request(symbol: &str, shares: u32, acquired: u32) -> CreateStockPositionDto {
        CreateStockPositionDto {
            account_id: "acct".to_string(),
            symbol: symbol.to_string(),
            shares,
            cost_basis_per_share: dec!(150),
            acquired_date: day(acquired),
            notes: None,
        }
    }

    async fn write_call(fx: &Fixture, lot: &StockPositionId, contracts: u32) -> crate::domain::shared::TradeId {
        fx.create_trade()
            .execute(
                &fx.alice,
                CreateTradeDto {
                    account_id: "acct".to_string(),
                    symbol: Some("AAPL".to_string()),
                    trade_type: Some(TradeType::CoveredCall),
                    trade_action: Some(TradeAction::SoldToOpen),
                    strike_price: Some(dec!(160)),
                    expiration_date: Some(day(31)),
                    contract_quantity: Some(contracts),
                    trade_price: Some(dec!(1)),
                    trade_date: Some(day(3)),
                    stock_position_id: Some(lot.to_string()),
                    ..CreateTradeDto::default()
                },
            )
            .await
            .unwrap()
            .trade
            .id()
            .clone()
    }

    #[tokio::test]
    async fn create_validates_and_normalizes() {
        let fx = Fixture::new().await;
        let uc = fx.stock_positions();
        let dto = uc
            .create_stock_position(&fx.alice, lot_request("aapl", 300, 1))
            .await
            .unwrap();
        assert_eq!(dto.position.symbol().as_str(), "AAPL");
        assert_eq!(dto.available_shares, 300);

        let err = uc
            .create_stock_position(&fx.alice, lot_request("AAPL", 0, 1))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn shares_cannot_drop_below_reserved() {
        let fx = Fixture::new().await;
        let lot = fx.seed_lot("AAPL", 300).await;
        write_call(&fx, &lot, 2).await;
        let uc = fx.stock_positions();
        assert_eq!(uc.get_available_shares(&fx.alice, &lot).await.unwrap(), 100);

        let patch = StockPositionPatch {
            shares: Some(100),
            ..StockPositionPatch::default()
        };
        let err = uc.update_stock_position(&fx.alice, &lot, patch).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot reduce shares to 100. 200 shares are currently used by active covered calls."
        );

        let patch = StockPositionPatch {
            shares: Some(200),
            ..StockPositionPatch::default()
        };
        let dto = uc.update_stock_position(&fx.alice, &lot, patch).await.unwrap();
        assert_eq!(dto.available_shares, 0);

        let patch = StockPositionPatch {
            symbol: Some(Symbol::new("MSFT")),
            ..StockPositionPatch::default()
        };
        assert!(uc.update_stock_position(&fx.alice, &lot, patch).await.is_err());
    }

    #[tokio::test]
    async fn delete_blocked_by_open_calls() {
        let fx = Fixture::new().await;
        let lot = fx.seed_lot("AAPL", 100).await;
        let call = write_call(&fx, &lot, 1).await;
        let uc = fx.stock_positions();

        let err = uc.delete_stock_position(&fx.alice, &lot).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::HasLinkedEntries);

        fx.close_trade()
            .execute(&fx.alice, &call, CloseTradeDto::new(CloseMethod::Expired))
            .await
            .unwrap();
        uc.delete_stock_position(&fx.alice, &lot).await.unwrap();
        assert!(fx.positions().await.is_empty());
    }

    #[tokio::test]
    async fn available_listing_skips_full_and_closed_lots() {
        let fx = Fixture::new().await;
        let uc = fx.stock_positions();
        let newer = uc
            .create_stock_position(&fx.alice, lot_request("AAPL", 100, 8))
            .await
            .unwrap();
        let older = uc
            .create_stock_position(&fx.alice, lot_request("AAPL", 200, 2))
            .await
            .unwrap();
        let emptied = uc
            .create_stock_position(&fx.alice, lot_request("AAPL", 100, 1))
            .await
            .unwrap();
        uc.create_stock_position(&fx.alice, lot_request("MSFT", 100, 1))
            .await
            .unwrap();
        write_call(&fx, newer.position.id(), 1).await;
        let patch = StockPositionPatch {
            status: Some(PositionStatus::CalledAway),
            ..StockPositionPatch::default()
        };
        uc.update_stock_position(&fx.alice, emptied.position.id(), patch)
            .await
            .unwrap();

        let listed = uc
            .list_available_positions(&fx.alice, &AccountId::new("acct"), Some("aapl"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].position.id(), older.position.id());

        let all = uc.list_positions(&fx.alice, None).await.unwrap();
        assert_eq!(all.len(), 4);
    }
}
