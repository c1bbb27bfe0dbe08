//! Time-Based Return Calculator

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, contract_notional};
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::value_objects::{TradeStatus, TradeType};

/// Holding period and return figures for one trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// Days between the effective open and close dates.
    pub days_held: i64,
    /// `realized / capital × 100`, or None when no meaningful return exists.
    pub simple_return_pct: Option<Decimal>,
    /// Compounded yearly equivalent of the simple return.
    pub annualized_return_pct: Option<Decimal>,
    /// Realized P&L the figures were computed from.
    pub realized_pnl: Money,
    /// Notional capital the position could require.
    pub capital_at_risk: Money,
}

/// Notional capital a trade could require.
///
/// Assignment entries use the assignment price, everything else the strike.
#[must_use]
pub fn capital_at_risk(trade: &Trade) -> Money {
    let price = if trade.trade_type() == TradeType::Assignment {
        trade.assignment_price()
    } else {
        trade.strike_price()
    };
    price.map_or(Money::ZERO, |p| {
        Money::new(contract_notional(p, trade.contract_quantity()))
    })
}

/// Date the holding period ends on.
#[must_use]
pub fn close_effective_date(trade: &Trade, today: NaiveDate) -> NaiveDate {
    if let Some(close) = trade.close_date() {
        return close;
    }
    let still_open = trade.status() == TradeStatus::Open
        || (trade.trade_type() == TradeType::Assignment
            && trade.status() == TradeStatus::Assigned);
    if still_open {
        return today;
    }
    match trade.status() {
        TradeStatus::Closed | TradeStatus::Expired => {
            trade.expiration_date().unwrap_or(trade.trade_date())
        }
        _ => trade.trade_date(),
    }
}

/// Compute holding period and returns for a trade.
///
/// `realized_pnl` is supplied by the caller so display adjustments can be
/// applied before the percentages are derived.
#[must_use]
pub fn time_based_return(trade: &Trade, realized_pnl: Money, today: NaiveDate) -> ReturnMetrics {
    let opened = trade.open_date().unwrap_or(trade.trade_date());
    let days_held = (close_effective_date(trade, today) - opened).num_days().max(0);
    let capital = capital_at_risk(trade);

    let (simple_return_pct, annualized_return_pct) =
        if days_held > 0 && !realized_pnl.is_zero() && capital.is_positive() {
            let ratio = realized_pnl.amount() / capital.amount();
            (
                Some((ratio * Decimal::ONE_HUNDRED).round_dp(2)),
                annualize(ratio, days_held),
            )
        } else {
            (None, None)
        };

    ReturnMetrics {
        days_held,
        simple_return_pct,
        annualized_return_pct,
        realized_pnl,
        capital_at_risk: capital,
    }
}

fn annualize(ratio: Decimal, days_held: i64) -> Option<Decimal> {
    let growth = 1.0 + ratio.to_f64()?;
    if growth <= 0.0 {
        return Some(Decimal::from(-100));
    }
    #[allow(clippy::cast_precision_loss)]
    let exponent = 365.0 / days_held as f64;
    let pct = (growth.powf(exponent) - 1.0) * 100.0;
    if !pct.is_finite() {
        return None;
    }
    Decimal::from_f64(pct).map(|d| d.round_dp(2))
}
