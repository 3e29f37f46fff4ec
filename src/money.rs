//! Fixed-point decimal arithmetic for monetary values and pressures.
//!
//! Wraps `rust_decimal::Decimal` so that prices, balances, pressures and
//! weighted volumes never touch binary floating point. All rounding happens
//! at the single site in this module: half-up, at the scale the value's
//! domain calls for (10,2 for money, 6,3 for pressures, 8,1 for weighted
//! volumes).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Decimal places for monetary columns (prices, balances, totals).
pub const MONEY_SCALE: u32 = 2;
/// Decimal places for demand/supply/net pressure columns.
pub const PRESSURE_SCALE: u32 = 3;
/// Decimal places for raw/weighted volume columns.
pub const VOLUME_SCALE: u32 = 1;

/// A decimal quantity used for prices, balances and pressures.
///
/// `Money` is deliberately scale-agnostic at the type level (the same type
/// backs a 10,2 price and a 6,3 pressure); callers round to the scale their
/// column requires via [`Money::round_money`], [`Money::round_pressure`] or
/// [`Money::round_volume`] at the point the value is persisted or quoted.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::str")] Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);

    pub fn from_f64(value: f64) -> Self {
        Money(Decimal::try_from(value).unwrap_or(Decimal::ZERO))
    }

    pub fn from_i64(value: i64) -> Self {
        Money(Decimal::from(value))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Money(value)
    }

    pub fn to_f64(self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// Clamp into `[lo, hi]`. `lo` must be <= `hi`.
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    fn round_dp_half_up(self, dp: u32) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Round to the 10,2 monetary scale, half-up.
    pub fn round_money(self) -> Self {
        self.round_dp_half_up(MONEY_SCALE)
    }

    /// Round to the 6,3 pressure scale, half-up.
    pub fn round_pressure(self) -> Self {
        self.round_dp_half_up(PRESSURE_SCALE)
    }

    /// Round to the 8,1 weighted-volume scale, half-up.
    pub fn round_volume(self) -> Self {
        self.round_dp_half_up(VOLUME_SCALE)
    }

    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
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

impl std::hash::Hash for Money {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
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
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul for Money {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Money(self.0 * rhs.0)
    }
}

impl Div for Money {
    type Output = Self;
    fn div(self, rhs: Self) -> Self::Output {
        if rhs.0.is_zero() {
            Money::ZERO
        } else {
            Money(self.0 / rhs.0)
        }
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl From<f64> for Money {
    fn from(value: f64) -> Self {
        Money::from_f64(value)
    }
}

impl From<Money> for f64 {
    fn from(value: Money) -> Self {
        value.to_f64()
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Money::from_i64(value)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_survives_addition() {
        let a = Money::from_f64(0.1);
        let b = Money::from_f64(0.2);
        let c = Money::from_f64(0.3);
        assert_eq!(a + b, c);
    }

    #[test]
    fn round_money_is_half_up() {
        let v = Money::from_f64(1.005);
        assert_eq!(v.round_money().to_f64(), 1.01);
        let v = Money::from_f64(1.004);
        assert_eq!(v.round_money().to_f64(), 1.00);
    }

    #[test]
    fn clamp_respects_bounds() {
        let lo = Money::from_f64(1.0);
        let hi = Money::from_f64(6.0);
        assert_eq!(Money::from_f64(0.5).clamp(lo, hi), lo);
        assert_eq!(Money::from_f64(9.0).clamp(lo, hi), hi);
        assert_eq!(Money::from_f64(3.0).clamp(lo, hi), Money::from_f64(3.0));
    }

    #[test]
    fn div_by_zero_is_zero() {
        assert_eq!(Money::from_f64(5.0) / Money::ZERO, Money::ZERO);
    }
}
