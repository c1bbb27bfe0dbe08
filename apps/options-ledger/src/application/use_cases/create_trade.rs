//! Create Trade Use Case
//!
//! Records an opening trade, a priced closing leg against a parent, or an
//! Assignment entry. Parent status, share reservations and assigned share lots
//! are written in the same change set as the new entry.

use std::sync::Arc;

use crate::application::dto::{CreateTradeDto, TradeDto};
use crate::application::ports::{ChangeSet, Clock, LedgerStore};
use crate::domain::accounts::Account;
use crate::domain::shared::{AccountId, Money, StockPositionId, Symbol, TradeId, UserId};
use crate::domain::stock_ledger::{NewStockPositionCommand, ShareAvailability, StockPosition};
use crate::domain::trade_lifecycle::{
    NewTradeCommand, StatusResolver, Trade, TradeError, TradeStatus, TradeType,
};
use crate::error::LedgerError;

use super::support::{load_graph, log_failure, owned_account, owned_position, owned_trade};

/// Use case for recording trades.
pub struct CreateTradeUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> CreateTradeUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Create a new `CreateTradeUseCase`.
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Record a trade in one of the actor's accounts.
    ///
    /// # Errors
    ///
    /// Returns error if the account or a referenced entry is missing or not
    /// owned by the actor, if the request fails validation, or if the store
    /// rejects the write.
    pub async fn execute(
        &self,
        actor: &UserId,
        request: CreateTradeDto,
    ) -> Result<TradeDto, LedgerError> {
        let result = self.create(actor, request).await;
        if let Err(e) = &result {
            log_failure("create_trade", e);
        }
        result
    }

    async fn create(&self, actor: &UserId, request: CreateTradeDto) -> Result<TradeDto, LedgerError> {
        let today = self.clock.today();
        let account_id = AccountId::new(request.account_id.clone());
        let account = owned_account(self.store.as_ref(), actor, &account_id).await?;
        let trade_type = request
            .trade_type
            .ok_or_else(|| TradeError::invalid("trade_type", "is required"))?;
        let trade_date = request.trade_date.unwrap_or(today);

        // 1. Resolve the parent against fresh store state
        let graph = load_graph(self.store.as_ref(), std::slice::from_ref(&account_id)).await?;
        let parent = match &request.parent_trade_id {
            Some(raw) => {
                let (parent, _) =
                    owned_trade(self.store.as_ref(), actor, &TradeId::new(raw.clone())).await?;
                if parent.account_id() != &account_id {
                    return Err(TradeError::invalid(
                        "parent_trade_id",
                        format!("trade {} belongs to another account", parent.id()),
                    )
                    .into());
                }
                Some(parent)
            }
            None => None,
        };

        let is_assignment = trade_type == TradeType::Assignment;
        let closes_parent = parent.is_some()
            && (is_assignment || request.trade_action.is_some_and(|a| a.is_closing()));

        // 2. Fill inherited fields
        let inherited = parent.as_ref().filter(|_| closes_parent);
        let quantity = request
            .contract_quantity
            .or_else(|| inherited.filter(|_| is_assignment).map(Trade::contract_quantity))
            .unwrap_or(1);
        if let Some(parent) = inherited {
            let remaining = graph.remaining_open_quantity(parent);
            if quantity > remaining {
                return Err(TradeError::QuantityExceedsRemaining {
                    requested: quantity,
                    remaining,
                }
                .into());
            }
        }
        let symbol = request
            .symbol
            .clone()
            .map(Symbol::new)
            .or_else(|| inherited.map(|p| p.symbol().clone()))
            .ok_or_else(|| TradeError::invalid("symbol", "Symbol is required"))?;
        let strike_price = request
            .strike_price
            .or_else(|| inherited.and_then(Trade::strike_price));
        let expiration_date = request
            .expiration_date
            .or_else(|| inherited.and_then(Trade::expiration_date));
        let assignment_price = if is_assignment {
            request.assignment_price.or(strike_price)
        } else {
            request.assignment_price
        };

        // 3. Covered calls must be backed by free shares
        let stock_position_id = request.stock_position_id.clone().map(StockPositionId::new);
        let writes_call = trade_type == TradeType::CoveredCall
            && request.trade_action.is_some_and(|a| a.is_opening());
        if writes_call {
            let position_id = stock_position_id
                .as_ref()
                .ok_or(TradeError::MissingStockPosition)?;
            let (position, _) = owned_position(self.store.as_ref(), actor, position_id).await?;
            ShareAvailability::ensure_link(&position, &account_id, &symbol)?;
            let calls = self
                .store
                .find_covered_calls_for_position(position_id)
                .await?;
            ShareAvailability::ensure_can_cover(&position, &calls, quantity)?;
        }

        // 4. Build the entry
        let closing_action = request.trade_action.is_some_and(|a| a.is_closing());
        let command = NewTradeCommand {
            account_id: account_id.clone(),
            symbol,
            trade_type,
            position_type: request.position_type,
            trade_action: request.trade_action,
            strike_price,
            expiration_date,
            contract_quantity: quantity,
            trade_price: request.trade_price,
            fees: request.fees.unwrap_or_else(|| account.default_fee()),
            premium: request.premium.map(Money::new),
            trade_date,
            open_date: match (&parent, closing_action) {
                (Some(p), true) => Some(p.trade_date()),
                _ => request.open_date,
            },
            close_date: if closing_action {
                Some(request.close_date.unwrap_or(trade_date))
            } else {
                request.close_date
            },
            assignment_price,
            assignment_fee: request.assignment_fee.map_or(Money::ZERO, Money::new),
            status: request.status.unwrap_or_default(),
            parent_trade_id: parent.as_ref().map(|p| p.id().clone()),
            stock_position_id,
            notes: request.notes.clone(),
        };
        let mut trade = Trade::new(TradeId::generate(), command)?;
        let status = if closing_action {
            TradeStatus::Closed
        } else if let Some(explicit) = request.status {
            explicit
        } else {
            StatusResolver::resolve(&trade, &[], today)
        };
        trade.set_status(status);

        // 5. Parent and share side effects
        let mut changes = ChangeSet::new();
        if let Some(mut parent) = parent.filter(|_| closes_parent) {
            if is_assignment {
                if parent.trade_type() == TradeType::Csp
                    && let Some(price) = assignment_price
                {
                    parent.mark_assigned(trade_date, price);
                }
                let lot = assigned_lot(&account, &trade, quantity, assignment_price)?;
                changes.put_position(lot);
            } else if !parent.status().is_terminal_marker() {
                let closed = graph.closed_quantity(parent.id()) + quantity;
                parent.sync_with_closed_quantity(closed, trade.close_date().unwrap_or(trade_date));
            }
            changes.put_trade(parent);
        }
        changes.put_trade(trade.clone());

        // 6. Commit and report from fresh state
        self.store.commit(changes).await?;
        tracing::info!(
            trade_id = %trade.id(),
            account_id = %account_id,
            trade_type = %trade.trade_type(),
            quantity,
            "Trade recorded"
        );

        let graph = load_graph(self.store.as_ref(), &[account_id]).await?;
        let stored = graph.get(trade.id()).unwrap_or(&trade);
        Ok(TradeDto::from_trade(stored, &graph, today))
    }
}

fn assigned_lot(
    account: &Account,
    entry: &Trade,
    contracts: u32,
    assignment_price: Option<rust_decimal::Decimal>,
) -> Result<StockPosition, LedgerError> {
    let cost = assignment_price.ok_or(TradeError::MissingAssignmentPrice {
        close_method: crate::domain::trade_lifecycle::CloseMethod::Assigned,
    })?;
    let command = NewStockPositionCommand::from_contracts(
        account.id().clone(),
        entry.symbol().clone(),
        contracts,
        cost,
        entry.trade_date(),
        entry.id().clone(),
    );
    Ok(StockPosition::new(StockPositionId::generate(), command)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::test_support::{Fixture, day};
    use crate::domain::trade_lifecycle::TradeAction;
    use crate::error::ErrorCode;
    use rust_decimal_macros::dec;

    fn csp_request(quantity: u32) -> CreateTradeDto {
        CreateTradeDto {
            account_id: "acct".to_string(),
            symbol: Some("aapl".to_string()),
            trade_type: Some(TradeType::Csp),
            trade_action: Some(TradeAction::SoldToOpen),
            strike_price: Some(dec!(150)),
            expiration_date: Some(day(31)),
            contract_quantity: Some(quantity),
            trade_price: Some(dec!(2.00)),
            fees: Some(dec!(0)),
            trade_date: Some(day(2)),
            ..CreateTradeDto::default()
        }
    }

    #[tokio::test]
    async fn records_opening_trade_with_computed_premium() {
        let fx = Fixture::new().await;
        let dto = fx.create_trade().execute(&fx.alice, csp_request(1)).await.unwrap();
        assert_eq!(dto.trade.premium(), Money::new(dec!(200)));
        assert_eq!(dto.trade.symbol().as_str(), "AAPL");
        assert_eq!(dto.trade.status(), TradeStatus::Open);
        assert_eq!(dto.remaining_open_quantity, Some(1));
    }

    #[tokio::test]
    async fn fees_default_to_the_account_fee() {
        let fx = Fixture::new().await;
        let mut request = csp_request(1);
        request.fees = None;
        let dto = fx.create_trade().execute(&fx.alice, request).await.unwrap();
        // Fixture account charges 0.65 per contract.
        assert_eq!(dto.trade.fees(), dec!(0.65));
        assert_eq!(dto.trade.premium(), Money::new(dec!(199.35)));
    }

    #[tokio::test]
    async fn closing_leg_updates_parent() {
        let fx = Fixture::new().await;
        let uc = fx.create_trade();
        let parent = uc.execute(&fx.alice, csp_request(2)).await.unwrap();

        let leg = CreateTradeDto {
            account_id: "acct".to_string(),
            trade_type: Some(TradeType::Csp),
            trade_action: Some(TradeAction::BoughtToClose),
            contract_quantity: Some(1),
            trade_price: Some(dec!(0.50)),
            fees: Some(dec!(1.50)),
            trade_date: Some(day(10)),
            parent_trade_id: Some(parent.trade.id().to_string()),
            ..CreateTradeDto::default()
        };
        let child = uc.execute(&fx.alice, leg.clone()).await.unwrap();
        assert_eq!(child.trade.status(), TradeStatus::Closed);
        assert_eq!(child.trade.open_date(), Some(day(2)));
        assert_eq!(child.trade.close_date(), Some(day(10)));
        assert_eq!(child.trade.symbol().as_str(), "AAPL");
        assert_eq!(child.trade.premium(), Money::new(dec!(-51.50)));
        assert_eq!(child.realized_pnl, Money::new(dec!(148.50)));

        let stored = fx.trade(parent.trade.id()).await;
        assert_eq!(stored.status(), TradeStatus::Open);

        uc.execute(&fx.alice, leg.clone()).await.unwrap();
        let stored = fx.trade(parent.trade.id()).await;
        assert_eq!(stored.status(), TradeStatus::Closed);
        assert_eq!(stored.close_date(), Some(day(10)));

        let err = uc.execute(&fx.alice, leg).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::QuantityExceedsRemaining);
        assert!(err.to_string().contains("Only 0 contracts remaining open"));
    }

    #[tokio::test]
    async fn assignment_entry_marks_put_and_creates_lot() {
        let fx = Fixture::new().await;
        let uc = fx.create_trade();
        let parent = uc.execute(&fx.alice, csp_request(2)).await.unwrap();

        let entry = CreateTradeDto {
            account_id: "acct".to_string(),
            trade_type: Some(TradeType::Assignment),
            trade_date: Some(day(31)),
            parent_trade_id: Some(parent.trade.id().to_string()),
            ..CreateTradeDto::default()
        };
        let dto = uc.execute(&fx.alice, entry).await.unwrap();
        assert_eq!(dto.trade.contract_quantity(), 2);
        assert_eq!(dto.trade.strike_price(), Some(dec!(150)));
        assert_eq!(dto.trade.assignment_price(), Some(dec!(150)));
        assert_eq!(dto.trade.premium(), Money::ZERO);
        assert_eq!(dto.trade.status(), TradeStatus::Assigned);

        let put = fx.trade(parent.trade.id()).await;
        assert_eq!(put.status(), TradeStatus::Assigned);
        assert_eq!(put.close_date(), Some(day(31)));

        let lots = fx.positions().await;
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].shares(), 200);
        assert_eq!(lots[0].cost_basis_per_share(), dec!(150));
        assert_eq!(lots[0].source_trade_id(), Some(dto.trade.id()));
    }

    #[tokio::test]
    async fn covered_call_needs_free_shares() {
        let fx = Fixture::new().await;
        let lot = fx.seed_lot("AAPL", 100).await;
        let uc = fx.create_trade();
        let call = CreateTradeDto {
            account_id: "acct".to_string(),
            symbol: Some("AAPL".to_string()),
            trade_type: Some(TradeType::CoveredCall),
            trade_action: Some(TradeAction::SoldToOpen),
            strike_price: Some(dec!(160)),
            expiration_date: Some(day(31)),
            contract_quantity: Some(1),
            trade_price: Some(dec!(3)),
            fees: Some(dec!(0)),
            trade_date: Some(day(2)),
            stock_position_id: Some(lot.to_string()),
            ..CreateTradeDto::default()
        };
        let dto = uc.execute(&fx.alice, call.clone()).await.unwrap();
        assert_eq!(dto.trade.shares_used(), Some(100));

        let err = uc.execute(&fx.alice, call.clone()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientShares);

        let mut unlinked = call.clone();
        unlinked.stock_position_id = None;
        let err = uc.execute(&fx.alice, unlinked).await.unwrap_err();
        assert!(err.is_validation());

        let mut wrong_symbol = call;
        wrong_symbol.symbol = Some("MSFT".to_string());
        let err = uc.execute(&fx.alice, wrong_symbol).await.unwrap_err();
        assert!(err.to_string().contains("symbol"));
    }

    #[tokio::test]
    async fn other_users_account_is_forbidden() {
        let fx = Fixture::new().await;
        let err = fx
            .create_trade()
            .execute(&UserId::new("mallory"), csp_request(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let mut request = csp_request(1);
        request.account_id = "missing".to_string();
        let err = fx.create_trade().execute(&fx.alice, request).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountNotFound);
    }

    #[tokio::test]
    async fn expired_opener_resolves_closed() {
        let fx = Fixture::new().await;
        let mut request = csp_request(1);
        request.expiration_date = Some(day(1));
        request.trade_date = Some(day(1));
        let dto = fx.create_trade().execute(&fx.alice, request).await.unwrap();
        assert_eq!(dto.trade.status(), TradeStatus::Closed);
    }
}
