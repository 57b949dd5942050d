//! Integer minor-unit money arithmetic.
//!
//! All settlement-currency values are [`Amount`]s: unsigned integer counts
//! of the currency's smallest unit. There is no floating point anywhere in
//! a money path — notional values go through `u128` and royalty rates are
//! basis points with explicit rounding direction, which is what makes the
//! conservation invariant (`Σ payments == notional`) an exact integer
//! equality rather than an epsilon comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MarketError, Result, constants::BPS_DENOMINATOR};

/// A settlement-currency value in integer minor units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Construct from a raw minor-unit count.
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// The raw minor-unit count.
    #[must_use]
    pub const fn minor(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    ///
    /// # Errors
    /// Returns [`MarketError::AmountOverflow`] on overflow.
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MarketError::AmountOverflow)
    }

    /// Checked subtraction.
    ///
    /// # Errors
    /// Returns [`MarketError::LedgerUnderflow`] if `other > self`.
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(MarketError::LedgerUnderflow {
                have: self,
                need: other,
            })
    }

    /// Saturating subtraction — clamps at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Saturating addition — clamps at the minor-unit maximum.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Notional value of `quantity` units at this per-unit price.
    ///
    /// The multiplication runs in `u128`; a product that does not fit the
    /// minor-unit range is an overflow error, never a silent wrap.
    ///
    /// # Errors
    /// Returns [`MarketError::AmountOverflow`] if the product exceeds `u64`.
    pub fn notional(self, quantity: u64) -> Result<Self> {
        let product = u128::from(self.0) * u128::from(quantity);
        u64::try_from(product)
            .map(Self)
            .map_err(|_| MarketError::AmountOverflow)
    }

    /// `ceil(self × bps / 10_000)` — the rounding rule for royalty totals
    /// and primary shares. The remainder share is always produced by
    /// subtraction from the total, never rounded independently.
    #[must_use]
    pub fn mul_bps_ceil(self, bps: u16) -> Self {
        let denom = u128::from(BPS_DENOMINATOR);
        let product = u128::from(self.0) * u128::from(bps);
        let ceiled = (product + denom - 1) / denom;
        // bps is validated <= 10_000 by RoyaltyConfig, so the share never
        // exceeds the input amount.
        Self(u64::try_from(ceiled).unwrap_or(u64::MAX))
    }

    /// Whole units purchasable with this balance at the given per-unit
    /// price (floor division). A zero price affords nothing — a free order
    /// never reaches the fill path because its notional is below any dust
    /// threshold.
    #[must_use]
    pub const fn affordable_units(self, price: Self) -> u64 {
        if price.0 == 0 { 0 } else { self.0 / price.0 }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_and_sub() {
        let a = Amount::from_minor(100);
        let b = Amount::from_minor(40);
        assert_eq!(a.checked_add(b).unwrap(), Amount::from_minor(140));
        assert_eq!(a.checked_sub(b).unwrap(), Amount::from_minor(60));
    }

    #[test]
    fn sub_underflow_errors() {
        let a = Amount::from_minor(10);
        let err = a.checked_sub(Amount::from_minor(11)).unwrap_err();
        assert!(matches!(err, MarketError::LedgerUnderflow { .. }));
    }

    #[test]
    fn add_overflow_errors() {
        let a = Amount::from_minor(u64::MAX);
        let err = a.checked_add(Amount::from_minor(1)).unwrap_err();
        assert!(matches!(err, MarketError::AmountOverflow));
    }

    #[test]
    fn notional_multiplies_exactly() {
        let price = Amount::from_minor(1_000);
        assert_eq!(price.notional(7).unwrap(), Amount::from_minor(7_000));
        assert_eq!(price.notional(0).unwrap(), Amount::ZERO);
    }

    #[test]
    fn notional_overflow_errors() {
        let price = Amount::from_minor(u64::MAX);
        assert!(matches!(
            price.notional(2).unwrap_err(),
            MarketError::AmountOverflow
        ));
    }

    #[test]
    fn bps_ceil_rounds_up() {
        // 2.5% of 101 = 2.525 -> 3
        assert_eq!(
            Amount::from_minor(101).mul_bps_ceil(250),
            Amount::from_minor(3)
        );
        // exact multiples don't round
        assert_eq!(
            Amount::from_minor(10_000).mul_bps_ceil(250),
            Amount::from_minor(250)
        );
        assert_eq!(Amount::ZERO.mul_bps_ceil(250), Amount::ZERO);
    }

    #[test]
    fn bps_full_rate_is_identity() {
        assert_eq!(
            Amount::from_minor(12_345).mul_bps_ceil(10_000),
            Amount::from_minor(12_345)
        );
    }

    #[test]
    fn affordable_units_floors() {
        let balance = Amount::from_minor(2_500);
        assert_eq!(balance.affordable_units(Amount::from_minor(1_000)), 2);
        assert_eq!(balance.affordable_units(Amount::from_minor(2_500)), 1);
        assert_eq!(balance.affordable_units(Amount::from_minor(2_501)), 0);
        assert_eq!(balance.affordable_units(Amount::ZERO), 0);
    }
}
