//! Close Trade Use Case
//!
//! Resolves all or part of an open trade by one of its type's close methods.
//! A full close of an untouched trade is recorded on the trade itself; any
//! other close adds a child entry. Share lots delivered or called away move in
//! the same change set.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::application::dto::{CloseTradeDto, CloseTradeResponseDto, StockPositionDto, TradeDto};
use crate::application::ports::{ChangeSet, Clock, LedgerStore};
use crate::domain::accounts::Account;
use crate::domain::shared::{Money, StockPositionId, TradeId, UserId, shares_for};
use crate::domain::stock_ledger::{
    NewStockPositionCommand, ShareAvailability, StockPosition,
};
use crate::domain::trade_lifecycle::{
    CloseMethod, InlineClose, Trade, TradeError, TradeType, compute_premium,
};
use crate::error::LedgerError;

use super::support::{load_graph, log_failure, owned_position, owned_trade};

/// Validated close request.
struct ClosePlan {
    quantity: u32,
    is_full: bool,
    close: InlineClose,
}

/// Use case for the close workflow.
pub struct CloseTradeUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> CloseTradeUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Create a new `CloseTradeUseCase`.
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Close, expire, assign, call away or exercise contracts of a trade.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is missing or not owned by the actor, if the
    /// method or quantity is not allowed, if a required price is missing, if
    /// the linked lot lacks the shares to call away, or if the store rejects
    /// the write.
    pub async fn execute(
        &self,
        actor: &UserId,
        id: &TradeId,
        request: CloseTradeDto,
    ) -> Result<CloseTradeResponseDto, LedgerError> {
        let result = self.close(actor, id, request).await;
        if let Err(e) = &result {
            log_failure("close_trade", e);
        }
        result
    }

    async fn close(
        &self,
        actor: &UserId,
        id: &TradeId,
        request: CloseTradeDto,
    ) -> Result<CloseTradeResponseDto, LedgerError> {
        let today = self.clock.today();
        let (mut trade, account) = owned_trade(self.store.as_ref(), actor, id).await?;

        // 1. Validate against the stored children, re-read just now
        let graph = load_graph(self.store.as_ref(), std::slice::from_ref(account.id())).await?;
        let remaining = graph.remaining_open_quantity(&trade);
        let plan = plan_close(&trade, &account, remaining, &request, today)?;
        let method = plan.close.method;
        let has_children = graph.closing_children(trade.id()).next().is_some();

        // 2. Resolve the contracts
        let mut changes = ChangeSet::new();
        let (result_id, lot_source) = if plan.is_full && !has_children {
            trade.close_inline(plan.close.clone());
            if let Some(notes) = &request.notes {
                trade.append_notes(notes);
            }
            (trade.id().clone(), trade.id().clone())
        } else {
            let mut child = trade.closing_child(TradeId::generate(), &plan.close, plan.quantity);
            if let Some(notes) = &request.notes {
                child.append_notes(notes);
            }
            if plan.is_full {
                trade.finish_via_children(method, plan.close.date);
            } else {
                trade.keep_open_for_remainder();
            }
            if trade.trade_type() == TradeType::CoveredCall {
                trade.release_shares(shares_for(plan.quantity));
            }
            let child_id = child.id().clone();
            changes.put_trade(child);
            let result = if plan.is_full {
                trade.id().clone()
            } else {
                child_id.clone()
            };
            (result, child_id)
        };

        // 3. Share side effects
        let position = match method {
            CloseMethod::Assigned | CloseMethod::Exercise => {
                Some(delivered_lot(&trade, &plan, lot_source)?)
            }
            CloseMethod::CalledAway => Some(self.call_away(actor, &trade, plan.quantity).await?),
            _ => None,
        };
        if let Some(position) = &position {
            changes.put_position(position.clone());
        }
        changes.put_trade(trade.clone());

        // 4. Commit
        self.store.commit(changes).await?;
        tracing::info!(
            trade_id = %trade.id(),
            account_id = %account.id(),
            close_method = %method,
            quantity = plan.quantity,
            is_full = plan.is_full,
            "Trade closed"
        );

        let graph = load_graph(self.store.as_ref(), std::slice::from_ref(account.id())).await?;
        let resolved = graph.get(&result_id).unwrap_or(&trade);
        let stock_position = match position {
            Some(position) => {
                let calls = self
                    .store
                    .find_covered_calls_for_position(position.id())
                    .await?;
                let available = ShareAvailability::available(&position, &calls);
                Some(StockPositionDto::new(position, available))
            }
            None => None,
        };
        Ok(CloseTradeResponseDto {
            trade: TradeDto::from_trade(resolved, &graph, today),
            is_full: plan.is_full,
            stock_position,
        })
    }

    async fn call_away(
        &self,
        actor: &UserId,
        trade: &Trade,
        contracts: u32,
    ) -> Result<StockPosition, LedgerError> {
        let position_id = trade
            .stock_position_id()
            .ok_or(TradeError::MissingStockPosition)?;
        let (mut position, _) = owned_position(self.store.as_ref(), actor, position_id).await?;
        position.call_away(shares_for(contracts))?;
        Ok(position)
    }
}

fn plan_close(
    trade: &Trade,
    account: &Account,
    remaining: u32,
    request: &CloseTradeDto,
    today: chrono::NaiveDate,
) -> Result<ClosePlan, TradeError> {
    let method = request.close_method;
    if !trade.trade_type().allows_close_method(method) {
        return Err(TradeError::InvalidCloseMethod {
            trade_type: trade.trade_type(),
            close_method: method,
        });
    }
    if !trade.status().is_closeable() {
        return Err(TradeError::NotCloseable {
            status: trade.status(),
        });
    }
    if let Some(required) = method.required_opening_action()
        && trade.trade_action() != Some(required)
    {
        return Err(TradeError::OpeningActionMismatch {
            close_method: method,
            required,
        });
    }
    if remaining == 0 {
        return Err(TradeError::NothingRemaining);
    }
    let quantity = request.contract_quantity.unwrap_or(remaining);
    if quantity == 0 {
        return Err(TradeError::invalid("contract_quantity", "must be at least 1"));
    }
    if quantity > remaining {
        return Err(TradeError::QuantityExceedsRemaining {
            requested: quantity,
            remaining,
        });
    }

    let fees = request.fees.unwrap_or(Decimal::ZERO);
    if fees < Decimal::ZERO {
        return Err(TradeError::invalid("fees", "must not be negative"));
    }
    let date = request.close_date.unwrap_or_else(|| {
        if method.is_priced() {
            today
        } else {
            trade.expiration_date().unwrap_or(today)
        }
    });

    let (price, premium) = match method.closing_action() {
        Some(action) => {
            let price = request
                .trade_price
                .filter(|p| *p > Decimal::ZERO)
                .ok_or(TradeError::MissingPrice {
                    close_method: method,
                })?;
            (
                Some(price),
                compute_premium(Some(price), Some(action), quantity, fees),
            )
        }
        None if method == CloseMethod::Exercise => (trade.strike_price(), Money::ZERO),
        None => (None, Money::ZERO),
    };

    let moves_shares = matches!(
        method,
        CloseMethod::Assigned | CloseMethod::CalledAway | CloseMethod::Exercise
    );
    let assignment_price = if moves_shares {
        let price = request
            .assignment_price
            .or(trade.strike_price())
            .ok_or(TradeError::MissingAssignmentPrice {
                close_method: method,
            })?;
        if price <= Decimal::ZERO {
            return Err(TradeError::invalid("assignment_price", "must be greater than 0"));
        }
        Some(price)
    } else {
        None
    };
    let assignment_fee = match method {
        CloseMethod::Assigned | CloseMethod::CalledAway => Some(
            request
                .assignment_fee
                .map_or_else(|| account.assignment_fee(), Money::new),
        ),
        CloseMethod::Exercise => request.assignment_fee.map(Money::new),
        _ => None,
    };
    if let Some(fee) = assignment_fee {
        fee.ensure_non_negative("assignment_fee")?;
    }

    Ok(ClosePlan {
        quantity,
        is_full: remaining - quantity == 0,
        close: InlineClose {
            method,
            date,
            price,
            fees,
            premium,
            assignment_price,
            assignment_fee,
        },
    })
}

/// Lot delivered by an assigned put or an exercised call.
fn delivered_lot(
    trade: &Trade,
    plan: &ClosePlan,
    source: TradeId,
) -> Result<StockPosition, LedgerError> {
    let cost = plan
        .close
        .assignment_price
        .ok_or(TradeError::MissingAssignmentPrice {
            close_method: plan.close.method,
        })?;
    let command = NewStockPositionCommand::from_contracts(
        trade.account_id().clone(),
        trade.symbol().clone(),
        plan.quantity,
        cost,
        plan.close.date,
        source,
    );
    Ok(StockPosition::new(StockPositionId::generate(), command)?)
}
