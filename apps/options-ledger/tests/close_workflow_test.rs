//! Integration tests for the close workflow.
//!
//! Drives create/close/query use cases end-to-end through the in-memory store
//! and checks the realized P&L the ledger reports.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use options_ledger::application::dto::{CloseTradeDto, CreateAccountDto, CreateTradeDto};
use options_ledger::application::ports::FixedClock;
use options_ledger::config::LedgerConfig;
use options_ledger::domain::shared::{AccountId, Money, TradeId, UserId};
use options_ledger::domain::trade_lifecycle::{CloseMethod, TradeAction, TradeStatus, TradeType};
use options_ledger::error::ErrorCode;
use options_ledger::infrastructure::config::Container;
use options_ledger::infrastructure::persistence::InMemoryLedgerStore;

type Ledger = Container<InMemoryLedgerStore, FixedClock>;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

struct Harness {
    ledger: Ledger,
    trader: UserId,
    account: AccountId,
}

impl Harness {
    async fn new() -> Self {
        let ledger = Container::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(FixedClock::new(date(1, 20))),
            LedgerConfig::default(),
        );
        let trader = UserId::new("trader");
        let account = ledger
            .accounts_use_case()
            .create_account(
                &trader,
                CreateAccountDto {
                    name: "Wheel".to_string(),
                    initial_balance: dec!(50000),
                    default_fee: None,
                    assignment_fee: None,
                },
            )
            .await
            .unwrap();
        Self {
            ledger,
            trader,
            account: account.id().clone(),
        }
    }

    async fn open(
        &self,
        trade_type: TradeType,
        action: TradeAction,
        strike: Decimal,
        quantity: u32,
        price: Decimal,
    ) -> TradeId {
        self.ledger
            .create_trade_use_case()
            .execute(
                &self.trader,
                CreateTradeDto {
                    account_id: self.account.to_string(),
                    symbol: Some("AAPL".to_string()),
                    trade_type: Some(trade_type),
                    trade_action: Some(action),
                    strike_price: Some(strike),
                    expiration_date: Some(date(1, 31)),
                    contract_quantity: Some(quantity),
                    trade_price: Some(price),
                    fees: Some(dec!(0)),
                    trade_date: Some(date(1, 2)),
                    ..CreateTradeDto::default()
                },
            )
            .await
            .unwrap()
            .trade
            .id()
            .clone()
    }

    async fn sell_put(&self, quantity: u32) -> TradeId {
        self.open(TradeType::Csp, TradeAction::SoldToOpen, dec!(150), quantity, dec!(2))
            .await
    }

    async fn realized(&self, id: &TradeId) -> Money {
        self.ledger
            .query_trades_use_case()
            .realized_pnl(&self.trader, id)
            .await
            .unwrap()
    }
}

fn buy_back(price: Decimal, quantity: Option<u32>) -> CloseTradeDto {
    CloseTradeDto {
        trade_price: Some(price),
        fees: Some(dec!(1.50)),
        contract_quantity: quantity,
        close_date: Some(date(1, 10)),
        ..CloseTradeDto::new(CloseMethod::BuyToClose)
    }
}

#[tokio::test]
async fn put_bought_back_in_full() {
    let h = Harness::new().await;
    let put = h.sell_put(1).await;

    let response = h
        .ledger
        .close_trade_use_case()
        .execute(&h.trader, &put, buy_back(dec!(0.50), None))
        .await
        .unwrap();

    assert!(response.is_full);
    assert_eq!(response.trade.trade.premium(), Money::new(dec!(200)));
    assert_eq!(
        response.trade.trade.close_premium(),
        Some(Money::new(dec!(-51.50)))
    );
    assert_eq!(h.realized(&put).await, Money::new(dec!(148.50)));
}

#[tokio::test]
async fn put_expires_worthless() {
    let h = Harness::new().await;
    let put = h.sell_put(1).await;

    let response = h
        .ledger
        .close_trade_use_case()
        .execute(&h.trader, &put, CloseTradeDto::new(CloseMethod::Expired))
        .await
        .unwrap();

    assert_eq!(response.trade.trade.status(), TradeStatus::Expired);
    assert_eq!(response.trade.trade.close_date(), Some(date(1, 31)));
    assert_eq!(h.realized(&put).await, Money::new(dec!(200)));
}

#[tokio::test]
async fn partial_buy_back_leaves_parent_open() {
    let h = Harness::new().await;
    let put = h.sell_put(2).await;

    let response = h
        .ledger
        .close_trade_use_case()
        .execute(&h.trader, &put, buy_back(dec!(0.50), Some(1)))
        .await
        .unwrap();

    assert!(!response.is_full);
    let child = response.trade;
    assert_eq!(child.trade.parent_trade_id(), Some(&put));
    assert_eq!(child.trade.premium(), Money::new(dec!(-51.50)));
    assert_eq!(child.realized_pnl, Money::new(dec!(148.50)));

    let parent = h
        .ledger
        .query_trades_use_case()
        .get_trade(&h.trader, &put)
        .await
        .unwrap();
    assert_eq!(parent.trade.status(), TradeStatus::Open);
    assert_eq!(parent.remaining_open_quantity, Some(1));
}

#[tokio::test]
async fn two_partial_closes_add_up() {
    let h = Harness::new().await;
    let put = h.sell_put(2).await;
    let close = h.ledger.close_trade_use_case();

    let first = close
        .execute(&h.trader, &put, buy_back(dec!(0.50), Some(1)))
        .await
        .unwrap();
    let second = close
        .execute(&h.trader, &put, buy_back(dec!(1.00), Some(1)))
        .await
        .unwrap();

    // The second close finishes the parent through its own child.
    assert!(second.is_full);
    assert_eq!(second.trade.trade.id(), &put);
    assert_eq!(second.trade.trade.status(), TradeStatus::Closed);
    assert_eq!(second.trade.remaining_open_quantity, Some(0));

    let chain = h
        .ledger
        .query_trades_use_case()
        .trade_chain(&h.trader, &put)
        .await
        .unwrap();
    let legs: Money = chain.children.iter().map(|c| c.realized_pnl).sum();
    // 400 opening premium, -51.50 and -101.50 to buy back.
    assert_eq!(legs, Money::new(dec!(247)));
    assert_eq!(first.trade.realized_pnl, Money::new(dec!(148.50)));
    assert_eq!(h.realized(&put).await, Money::new(dec!(247)));

    let err = close
        .execute(&h.trader, &put, buy_back(dec!(0.10), Some(1)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already Closed"));
}

#[tokio::test]
async fn over_closing_is_rejected_before_any_write() {
    let h = Harness::new().await;
    let put = h.sell_put(2).await;

    let err = h
        .ledger
        .close_trade_use_case()
        .execute(&h.trader, &put, buy_back(dec!(0.50), Some(3)))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::QuantityExceedsRemaining);
    assert!(err.to_string().contains("Only 2 contracts remaining open"));
    let chain = h
        .ledger
        .query_trades_use_case()
        .trade_chain(&h.trader, &put)
        .await
        .unwrap();
    assert!(chain.children.is_empty());
}

#[tokio::test]
async fn covered_call_called_away() {
    let h = Harness::new().await;
    let lot = h
        .ledger
        .stock_positions_use_case()
        .create_stock_position(
            &h.trader,
            options_ledger::application::dto::CreateStockPositionDto {
                account_id: h.account.to_string(),
                symbol: "AAPL".to_string(),
                shares: 100,
                cost_basis_per_share: dec!(150),
                acquired_date: date(1, 1),
                notes: None,
            },
        )
        .await
        .unwrap();
    let call = h
        .ledger
        .create_trade_use_case()
        .execute(
            &h.trader,
            CreateTradeDto {
                account_id: h.account.to_string(),
                symbol: Some("AAPL".to_string()),
                trade_type: Some(TradeType::CoveredCall),
                trade_action: Some(TradeAction::SoldToOpen),
                strike_price: Some(dec!(160)),
                expiration_date: Some(date(1, 31)),
                trade_price: Some(dec!(3)),
                fees: Some(dec!(0)),
                trade_date: Some(date(1, 2)),
                stock_position_id: Some(lot.position.id().to_string()),
                ..CreateTradeDto::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(call.trade.premium(), Money::new(dec!(300)));

    let response = h
        .ledger
        .close_trade_use_case()
        .execute(
            &h.trader,
            call.trade.id(),
            CloseTradeDto::new(CloseMethod::CalledAway),
        )
        .await
        .unwrap();

    assert_eq!(response.trade.trade.status(), TradeStatus::CalledAway);
    assert_eq!(response.trade.realized_pnl, Money::new(dec!(1300)));
    let position = response.stock_position.unwrap();
    assert_eq!(position.position.shares(), 0);
    assert_eq!(position.available_shares, 0);
}

#[tokio::test]
async fn leaps_expires_worthless() {
    let h = Harness::new().await;
    let leaps = h
        .open(TradeType::Leaps, TradeAction::BoughtToOpen, dec!(120), 1, dec!(80))
        .await;

    h.ledger
        .close_trade_use_case()
        .execute(&h.trader, &leaps, CloseTradeDto::new(CloseMethod::Expired))
        .await
        .unwrap();

    assert_eq!(h.realized(&leaps).await, Money::new(dec!(-8000)));
}

#[tokio::test]
async fn close_method_must_fit_the_trade_type() {
    let h = Harness::new().await;
    let leaps = h
        .open(TradeType::Leaps, TradeAction::BoughtToOpen, dec!(120), 1, dec!(80))
        .await;

    let err = h
        .ledger
        .close_trade_use_case()
        .execute(&h.trader, &leaps, CloseTradeDto::new(CloseMethod::Assigned))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidCloseMethod);
}
