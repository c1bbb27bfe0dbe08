//! Premium Calculator
//!
//! Converts a per-share option price, a directional action, a contract count and
//! a per-contract fee into the signed cash flow recorded as a trade's premium.

use rust_decimal::Decimal;

use crate::domain::shared::{Money, contract_notional};
use crate::domain::trade_lifecycle::value_objects::TradeAction;

/// Compute the signed premium of an option leg.
///
/// - Sold actions receive `price × qty × 100 − fees × qty`.
/// - Bought actions pay `−(price × qty × 100 + fees × qty)`.
///
/// A missing or zero price, or a missing action, yields zero so callers can fall
/// back to an explicitly supplied premium. The result is rounded to 2 dp.
#[must_use]
pub fn compute_premium(
    trade_price: Option<Decimal>,
    action: Option<TradeAction>,
    quantity: u32,
    fees_per_contract: Decimal,
) -> Money {
    let (Some(price), Some(action)) = (trade_price, action) else {
        return Money::ZERO;
    };
    if price.is_zero() {
        return Money::ZERO;
    }

    let base = contract_notional(price, quantity);
    let total_fees = fees_per_contract * Decimal::from(quantity);

    let amount = if action.is_sell() {
        base - total_fees
    } else {
        -(base + total_fees)
    };
    Money::new(amount).round()
}
