//! Option contract sizing.

use rust_decimal::Decimal;

/// Shares controlled by one standard equity option contract.
pub const SHARES_PER_CONTRACT: u32 = 100;

/// Number of shares represented by `contracts` option contracts.
#[must_use]
pub const fn shares_for(contracts: u32) -> u32 {
    contracts * SHARES_PER_CONTRACT
}

/// Notional value of `contracts` contracts at a per-share `price`.
#[must_use]
pub fn contract_notional(price: Decimal, contracts: u32) -> Decimal {
    price * Decimal::from(contracts) * Decimal::from(SHARES_PER_CONTRACT)
}
