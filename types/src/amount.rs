//! Coin amounts.
//!
//! Amounts are fixed-point integers (u64 raw units, 8 decimals) to avoid
//! floating-point errors. 1 coin = 100_000_000 raw.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Raw units per whole coin.
pub const COIN: u64 = 100_000_000;

/// A coin amount in raw units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Whole coins, no fractional part.
    pub fn from_coins(coins: u64) -> Self {
        Self(coins * COIN)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn saturating_mul(self, factor: u64) -> Self {
        Self(self.0.saturating_mul(factor))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:08}", self.0 / COIN, self.0 % COIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_coins_scales() {
        assert_eq!(Amount::from_coins(50).raw(), 50 * COIN);
    }

    #[test]
    fn checked_add_overflow_is_none() {
        assert!(Amount::new(u64::MAX).checked_add(Amount::new(1)).is_none());
    }

    #[test]
    fn checked_sub_underflow_is_none() {
        assert!(Amount::ZERO.checked_sub(Amount::new(1)).is_none());
    }

    #[test]
    fn saturating_mul_caps_at_max() {
        assert_eq!(Amount::from_coins(11).saturating_mul(3), Amount::from_coins(33));
        assert_eq!(
            Amount::new(u64::MAX).saturating_mul(2),
            Amount::new(u64::MAX)
        );
    }

    #[test]
    fn display_has_eight_decimals() {
        assert_eq!(Amount::from_coins(11).to_string(), "11.00000000");
        assert_eq!(Amount::new(1).to_string(), "0.00000001");
    }
}
