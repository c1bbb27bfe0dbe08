//! Money value object for signed cash amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::domain::shared::DomainError;

/// A signed monetary amount in USD.
///
/// Positive values are cash received, negative values are cash paid.
/// Internal precision is kept; [`Money::round`] applies the ledger's 2 dp rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Create a new Money value from a Decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a Money value from cents (integer).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Get the inner Decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if this amount is positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if this amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Get the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Round to 2 decimal places (banker's rounding).
    #[must_use]
    pub fn round(&self) -> Self {
        Self(self.0.round_dp(2))
    }

    /// Split this amount evenly over `units` and take `take` of them.
    ///
    /// Used to apportion an opening premium across partially closed contracts.
    /// Returns zero when `units` is zero.
    #[must_use]
    pub fn pro_rata(&self, take: u32, units: u32) -> Self {
        if units == 0 {
            return Self::ZERO;
        }
        Self(self.0 / Decimal::from(units) * Decimal::from(take))
    }

    /// Check that an amount supplied as input is not negative.
    ///
    /// # Errors
    ///
    /// Returns error naming `field` if the amount is negative.
    pub fn ensure_non_negative(&self, field: &str) -> Result<(), DomainError> {
        if self.is_negative() {
            return Err(DomainError::InvalidValue {
                field: field.to_string(),
                message: format!("must not be negative (got {self})"),
            });
        }
        Ok(())
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-${:.2}", self.0.abs())
        } else {
            write!(f, "${:.2}", self.0)
        }
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_display() {
        assert_eq!(format!("{}", Money::new(dec!(150.5))), "$150.50");
        assert_eq!(format!("{}", Money::new(dec!(-51.5))), "-$51.50");
    }

    #[test]
    fn money_from_cents() {
        let m = Money::from_cents(14850);
        assert_eq!(m.amount(), dec!(148.50));
    }

    #[test]
    fn money_arithmetic() {
        let a = Money::new(dec!(200));
        let b = Money::new(dec!(-51.50));
        assert_eq!(a + b, Money::new(dec!(148.50)));
        assert_eq!(a - b, Money::new(dec!(251.50)));
        assert_eq!(-a, Money::new(dec!(-200)));
        assert_eq!(a * dec!(2), Money::new(dec!(400)));
    }

    #[test]
    fn money_sum() {
        let total: Money = [dec!(1.10), dec!(2.20), dec!(-0.30)]
            .into_iter()
            .map(Money::new)
            .sum();
        assert_eq!(total, Money::new(dec!(3.00)));
    }

    #[test]
    fn money_round_uses_two_places() {
        assert_eq!(Money::new(dec!(1.005)).round(), Money::new(dec!(1.00)));
        assert_eq!(Money::new(dec!(1.015)).round(), Money::new(dec!(1.02)));
        assert_eq!(Money::new(dec!(-8000)).round(), Money::new(dec!(-8000.00)));
    }

    #[test]
    fn money_pro_rata() {
        let premium = Money::new(dec!(400));
        assert_eq!(premium.pro_rata(1, 2), Money::new(dec!(200)));
        assert_eq!(premium.pro_rata(3, 0), Money::ZERO);
    }

    #[test]
    fn money_ensure_non_negative() {
        assert!(Money::new(dec!(1.50)).ensure_non_negative("fees").is_ok());
        let err = Money::new(dec!(-1)).ensure_non_negative("fees").unwrap_err();
        assert!(err.to_string().contains("fees"));
    }

    #[test]
    fn money_ordering() {
        assert!(Money::new(dec!(-1)) < Money::ZERO);
        assert!(Money::new(dec!(2)).is_positive());
        assert!(Money::new(dec!(-2)).is_negative());
        assert!(Money::ZERO.is_zero());
    }
}
