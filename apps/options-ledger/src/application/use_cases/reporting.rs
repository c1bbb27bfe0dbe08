//! Reporting Use Case
//!
//! Portfolio-level figures built from the same P&L engine the trade views use:
//! realized and unrealized P&L over a period, the rate of return on account
//! capital, and how open contracts allocate that capital across symbols.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::application::dto::{
    AccountReportDto, AllocationDto, AllocationEntryDto, PortfolioPnlDto, ReportPeriod,
    TradeFilterDto,
};
use crate::application::ports::{Clock, LedgerStore};
use crate::domain::accounts::Account;
use crate::domain::shared::{AccountId, Money, UserId, contract_notional};
use crate::domain::trade_lifecycle::{
    Trade, TradeGraph, TradeStatus, TradeType, calculate_realized_pnl,
};
use crate::error::LedgerError;

use super::QueryTradesUseCase;
use super::support::{load_graph, log_failure, owned_account, scoped_accounts};

/// Use case for portfolio reports.
pub struct ReportingUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> ReportingUseCase<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Create a new `ReportingUseCase`.
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Realized and unrealized P&L of entries traded within `period`.
    ///
    /// # Errors
    ///
    /// Returns error if a requested account is missing or not owned by the
    /// actor, or if the store fails.
    pub async fn portfolio_pnl(
        &self,
        actor: &UserId,
        account_id: Option<&AccountId>,
        period: ReportPeriod,
    ) -> Result<PortfolioPnlDto, LedgerError> {
        let result = self.pnl(actor, account_id, period).await;
        if let Err(e) = &result {
            log_failure("portfolio_pnl", e);
        }
        result
    }

    async fn pnl(
        &self,
        actor: &UserId,
        account_id: Option<&AccountId>,
        period: ReportPeriod,
    ) -> Result<PortfolioPnlDto, LedgerError> {
        let accounts = scoped_accounts(self.store.as_ref(), actor, account_id).await?;
        let graph = self.graph(&accounts).await?;
        Ok(self.pnl_summary(&accounts, &graph, period))
    }

    /// Capital at risk in open contracts, grouped by symbol.
    ///
    /// # Errors
    ///
    /// Returns error if a requested account is missing or not owned by the
    /// actor, or if the store fails.
    pub async fn open_position_allocation(
        &self,
        actor: &UserId,
        account_id: Option<&AccountId>,
    ) -> Result<AllocationDto, LedgerError> {
        let accounts = scoped_accounts(self.store.as_ref(), actor, account_id).await?;
        let graph = self.graph(&accounts).await?;
        Ok(allocation(&accounts, &graph))
    }

    /// Trades, all-time P&L and allocation of one account.
    ///
    /// # Errors
    ///
    /// Returns error if the account is missing or not owned by the actor, or
    /// if the store fails.
    pub async fn account_report(
        &self,
        actor: &UserId,
        account_id: &AccountId,
    ) -> Result<AccountReportDto, LedgerError> {
        let account = owned_account(self.store.as_ref(), actor, account_id).await?;
        // Listing first so drifted statuses are saved before the figures are taken.
        let trades = QueryTradesUseCase::new(Arc::clone(&self.store), Arc::clone(&self.clock))
            .list_trades(
                actor,
                TradeFilterDto {
                    account_id: Some(account_id.to_string()),
                    ..TradeFilterDto::default()
                },
            )
            .await?;
        let accounts = std::slice::from_ref(&account);
        let graph = self.graph(accounts).await?;
        Ok(AccountReportDto {
            account_id: account.id().to_string(),
            name: account.name().to_string(),
            trades,
            pnl: self.pnl_summary(accounts, &graph, ReportPeriod::All),
            allocation: allocation(accounts, &graph),
        })
    }

    async fn graph(&self, accounts: &[Account]) -> Result<TradeGraph, LedgerError> {
        let ids: Vec<AccountId> = accounts.iter().map(|a| a.id().clone()).collect();
        load_graph(self.store.as_ref(), &ids).await
    }

    fn pnl_summary(
        &self,
        accounts: &[Account],
        graph: &TradeGraph,
        period: ReportPeriod,
    ) -> PortfolioPnlDto {
        let start = period.start(self.clock.today());
        let mut realized = Money::ZERO;
        let mut unrealized = Money::ZERO;
        let mut trade_count = 0;

        for trade in graph.trades().filter(|t| counts_toward_totals(t)) {
            if start.is_some_and(|s| trade.trade_date() < s) {
                continue;
            }
            trade_count += 1;
            realized += calculate_realized_pnl(trade, graph);
            if trade.status() == TradeStatus::Open && trade.is_opener() {
                let remaining = graph.remaining_open_quantity(trade);
                unrealized += trade.premium().pro_rata(remaining, trade.contract_quantity());
            }
        }

        let realized = realized.round();
        let unrealized = unrealized.round();
        let total_pnl = realized + unrealized;
        let total_capital = (contributed(accounts) + all_time_realized(graph)).round();
        PortfolioPnlDto {
            period,
            realized_pnl: realized,
            unrealized_pnl: unrealized,
            total_pnl,
            total_capital,
            rate_of_return_pct: percent_of(total_pnl, total_capital),
            trade_count,
        }
    }
}

/// Priced and expired legs roll up into their parent's P&L.
///
/// Other children count on their own: the parent only takes its pro-rata
/// premium for them, so the stock result of a called-away child and the fee
/// of an assigned child live on the child.
fn counts_toward_totals(trade: &Trade) -> bool {
    if trade.parent_trade_id().is_none() || trade.trade_type() == TradeType::Assignment {
        return true;
    }
    let expired_leg = trade.status() == TradeStatus::Expired && !trade.is_opener();
    !(trade.is_priced_closing_leg() || expired_leg)
}

fn contributed(accounts: &[Account]) -> Money {
    accounts.iter().map(Account::contributed_capital).sum()
}

fn all_time_realized(graph: &TradeGraph) -> Money {
    graph
        .trades()
        .filter(|t| counts_toward_totals(t))
        .map(|t| calculate_realized_pnl(t, graph))
        .sum()
}

/// `part / whole × 100` at 2 dp, or 0 without capital.
fn percent_of(part: Money, whole: Money) -> Decimal {
    if !whole.is_positive() {
        return Decimal::ZERO;
    }
    (part.amount() / whole.amount() * Decimal::ONE_HUNDRED).round_dp(2)
}

fn allocation(accounts: &[Account], graph: &TradeGraph) -> AllocationDto {
    let mut by_symbol: BTreeMap<String, (Money, u32)> = BTreeMap::new();
    for trade in graph.trades() {
        if trade.status() != TradeStatus::Open || !trade.is_opener() {
            continue;
        }
        let remaining = graph.remaining_open_quantity(trade);
        if remaining == 0 {
            continue;
        }
        let Some(price) = allocation_price(trade, graph) else {
            continue;
        };
        let entry = by_symbol
            .entry(trade.symbol().to_string())
            .or_insert((Money::ZERO, 0));
        entry.0 += Money::new(contract_notional(price, remaining));
        entry.1 += remaining;
    }

    let total_capital = (contributed(accounts) + all_time_realized(graph)).round();
    let mut entries: Vec<AllocationEntryDto> = by_symbol
        .into_iter()
        .map(|(symbol, (capital_at_risk, open_contracts))| AllocationEntryDto {
            symbol,
            capital_at_risk: capital_at_risk.round(),
            allocation_pct: percent_of(capital_at_risk, total_capital),
            open_contracts,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.capital_at_risk
            .cmp(&a.capital_at_risk)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let total_capital_at_risk: Money = entries.iter().map(|e| e.capital_at_risk).sum();
    let unallocated_capital = if total_capital.is_positive() {
        total_capital - total_capital_at_risk
    } else {
        Money::ZERO
    };
    AllocationDto {
        entries,
        total_capital_at_risk,
        total_capital,
        unallocated_capital,
    }
}

/// Per-share price the open contracts put at risk.
///
/// Covered calls written on assigned shares are valued at the assignment price.
fn allocation_price(trade: &Trade, graph: &TradeGraph) -> Option<Decimal> {
    if trade.trade_type() == TradeType::CoveredCall
        && let Some(parent) = graph
            .parent_of(trade)
            .filter(|p| p.trade_type() == TradeType::Assignment)
        && let Some(price) = parent.assignment_price()
    {
        return Some(price);
    }
    trade.strike_price()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::{CashFlowDto, CloseTradeDto, CreateTradeDto};
    use crate::application::use_cases::test_support::{Fixture, day};
    use crate::domain::accounts::CashFlowKind;
    use crate::domain::trade_lifecycle::{CloseMethod, TradeAction};
    use crate::error::ErrorCode;
    use rust_decimal_macros::dec;

    async fn half_bought_back(fx: &Fixture) {
        let id = fx.seed_csp(2).await;
        let close = CloseTradeDto {
            trade_price: Some(dec!(0.5)),
            fees: Some(dec!(1.5)),
            contract_quantity: Some(1),
            close_date: Some(day(10)),
            ..CloseTradeDto::new(CloseMethod::BuyToClose)
        };
        fx.close_trade().execute(&fx.alice, &id, close).await.unwrap();
    }

    #[tokio::test]
    async fn pnl_splits_realized_and_unrealized() {
        let fx = Fixture::new().await;
        half_bought_back(&fx).await;

        let pnl = fx
            .reporting()
            .portfolio_pnl(&fx.alice, None, ReportPeriod::All)
            .await
            .unwrap();
        assert_eq!(pnl.realized_pnl, Money::new(dec!(148.50)));
        assert_eq!(pnl.unrealized_pnl, Money::new(dec!(200)));
        assert_eq!(pnl.total_pnl, Money::new(dec!(348.50)));
        assert_eq!(pnl.total_capital, Money::new(dec!(10148.50)));
        assert_eq!(pnl.rate_of_return_pct, dec!(3.43));
        assert_eq!(pnl.trade_count, 1);
    }

    #[tokio::test]
    async fn period_filters_by_trade_date() {
        let fx = Fixture::new().await;
        half_bought_back(&fx).await;

        let pnl = fx
            .reporting()
            .portfolio_pnl(&fx.alice, None, ReportPeriod::Week)
            .await
            .unwrap();
        assert_eq!(pnl.realized_pnl, Money::ZERO);
        assert_eq!(pnl.unrealized_pnl, Money::ZERO);
        assert_eq!(pnl.trade_count, 0);
        // Capital always includes the all-time result.
        assert_eq!(pnl.total_capital, Money::new(dec!(10148.50)));
    }

    #[tokio::test]
    async fn allocation_by_symbol() {
        let fx = Fixture::new().await;
        fx.accounts()
            .record_cash_flow(
                &fx.alice,
                &AccountId::new("acct"),
                CashFlowDto {
                    kind: CashFlowKind::Deposit,
                    amount: dec!(20000),
                    date: day(1),
                    notes: None,
                },
            )
            .await
            .unwrap();
        fx.seed_csp(1).await;
        fx.create_trade()
            .execute(
                &fx.alice,
                CreateTradeDto {
                    account_id: "acct".to_string(),
                    symbol: Some("MSFT".to_string()),
                    trade_type: Some(TradeType::Leaps),
                    trade_action: Some(TradeAction::BoughtToOpen),
                    strike_price: Some(dec!(30)),
                    expiration_date: Some(day(31)),
                    trade_price: Some(dec!(5)),
                    trade_date: Some(day(3)),
                    ..CreateTradeDto::default()
                },
            )
            .await
            .unwrap();

        let allocation = fx
            .reporting()
            .open_position_allocation(&fx.alice, None)
            .await
            .unwrap();
        let symbols: Vec<&str> = allocation.entries.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(allocation.entries[0].capital_at_risk, Money::new(dec!(15000)));
        assert_eq!(allocation.entries[0].allocation_pct, dec!(50));
        assert_eq!(allocation.entries[1].allocation_pct, dec!(10));
        assert_eq!(allocation.total_capital, Money::new(dec!(30000)));
        assert_eq!(allocation.unallocated_capital, Money::new(dec!(12000)));
    }

    #[tokio::test]
    async fn called_away_in_two_steps_keeps_the_stock_gain() {
        let fx = Fixture::new().await;
        let lot = fx.seed_lot("AAPL", 200).await;
        let call = fx
            .create_trade()
            .execute(
                &fx.alice,
                CreateTradeDto {
                    account_id: "acct".to_string(),
                    symbol: Some("AAPL".to_string()),
                    trade_type: Some(TradeType::CoveredCall),
                    trade_action: Some(TradeAction::SoldToOpen),
                    strike_price: Some(dec!(160)),
                    expiration_date: Some(day(31)),
                    contract_quantity: Some(2),
                    trade_price: Some(dec!(1.5)),
                    fees: Some(dec!(0)),
                    trade_date: Some(day(3)),
                    stock_position_id: Some(lot.to_string()),
                    ..CreateTradeDto::default()
                },
            )
            .await
            .unwrap();
        let id = call.trade.id().clone();
        let called_away = |quantity| CloseTradeDto {
            contract_quantity: Some(quantity),
            assignment_fee: Some(dec!(0)),
            close_date: Some(day(10)),
            ..CloseTradeDto::new(CloseMethod::CalledAway)
        };
        fx.close_trade().execute(&fx.alice, &id, called_away(1)).await.unwrap();
        fx.close_trade().execute(&fx.alice, &id, called_away(1)).await.unwrap();

        let pnl = fx
            .reporting()
            .portfolio_pnl(&fx.alice, None, ReportPeriod::All)
            .await
            .unwrap();
        // 300 premium plus 10 per share over the 150 basis on 200 shares.
        assert_eq!(pnl.realized_pnl, Money::new(dec!(2300)));
        assert_eq!(pnl.unrealized_pnl, Money::ZERO);
        assert_eq!(pnl.trade_count, 3);
        assert_eq!(pnl.total_capital, Money::new(dec!(12300)));
    }

    #[tokio::test]
    async fn partial_assignment_fee_reaches_the_totals() {
        let fx = Fixture::new().await;
        let id = fx.seed_csp(2).await;
        let assigned = CloseTradeDto {
            contract_quantity: Some(1),
            ..CloseTradeDto::new(CloseMethod::Assigned)
        };
        fx.close_trade().execute(&fx.alice, &id, assigned).await.unwrap();

        let pnl = fx
            .reporting()
            .portfolio_pnl(&fx.alice, None, ReportPeriod::All)
            .await
            .unwrap();
        // Half the 400 premium realized, less the account's 15 assignment fee.
        assert_eq!(pnl.realized_pnl, Money::new(dec!(185)));
        assert_eq!(pnl.unrealized_pnl, Money::new(dec!(200)));
    }

    #[tokio::test]
    async fn account_report_bundles_everything() {
        let fx = Fixture::new().await;
        half_bought_back(&fx).await;

        let report = fx
            .reporting()
            .account_report(&fx.alice, &AccountId::new("acct"))
            .await
            .unwrap();
        assert_eq!(report.name, "Main");
        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.pnl.realized_pnl, Money::new(dec!(148.50)));
        assert_eq!(report.allocation.entries[0].open_contracts, 1);
    }

    #[tokio::test]
    async fn reports_are_scoped_to_the_owner() {
        let fx = Fixture::new().await;
        let err = fx
            .reporting()
            .portfolio_pnl(
                &UserId::new("mallory"),
                Some(&AccountId::new("acct")),
                ReportPeriod::All,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let empty = fx
            .reporting()
            .open_position_allocation(&UserId::new("mallory"), None)
            .await
            .unwrap();
        assert!(empty.entries.is_empty());
        assert_eq!(empty.unallocated_capital, Money::ZERO);
    }
}
