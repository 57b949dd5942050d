//! Royalty splitting in exact-conservation integer arithmetic.
//!
//! The split rule:
//! - royalty total = `ceil(gross × rate_bps)`
//! - primary share = `ceil(royalty × primary_share_bps)`
//! - secondary share = royalty − primary, by subtraction — never rounded
//!   independently, so the two shares sum exactly to the royalty total.
//!
//! A royalty share below the dust threshold is not paid out on its own: it
//! is folded back into the principal, so the conservation identity
//! `principal + primary + secondary == gross` holds for every input.

use bazaar_types::{Amount, RoyaltyConfig};

/// The exact decomposition of a gross notional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoyaltySplit {
    pub gross: Amount,
    /// Counterparty proceeds: gross − royalty, plus any folded-back dust.
    pub principal: Amount,
    /// Primary beneficiary's share. Zero when folded.
    pub primary: Amount,
    /// Secondary beneficiary's share. Zero when folded.
    pub secondary: Amount,
    /// Total royalty dust folded back into the principal.
    pub folded_dust: Amount,
}

impl RoyaltySplit {
    /// Split `gross` per the royalty configuration, folding sub-dust
    /// shares back into the principal.
    #[must_use]
    pub fn compute(gross: Amount, royalty: &RoyaltyConfig, dust_threshold: Amount) -> Self {
        let royalty_total = gross.mul_bps_ceil(royalty.rate_bps);
        let mut primary = royalty_total.mul_bps_ceil(royalty.primary_share_bps);
        // ceil can only reach, never exceed, the total (shares <= 10_000 bps)
        let mut secondary = royalty_total.saturating_sub(primary);
        let mut principal = gross.saturating_sub(royalty_total);

        // Folded shares came out of the same gross, so these additions can
        // never exceed the original notional.
        let mut folded = Amount::ZERO;
        if !primary.is_zero() && primary < dust_threshold {
            folded = folded.saturating_add(primary);
            principal = principal.saturating_add(primary);
            primary = Amount::ZERO;
        }
        if !secondary.is_zero() && secondary < dust_threshold {
            folded = folded.saturating_add(secondary);
            principal = principal.saturating_add(secondary);
            secondary = Amount::ZERO;
        }

        Self {
            gross,
            principal,
            primary,
            secondary,
            folded_dust: folded,
        }
    }

    /// The conservation identity this split guarantees.
    #[must_use]
    pub fn conserves(&self) -> bool {
        let sum = u128::from(self.principal.minor())
            + u128::from(self.primary.minor())
            + u128::from(self.secondary.minor());
        sum == u128::from(self.gross.minor())
    }

    /// Royalty actually paid out (after fold-back).
    #[must_use]
    pub fn royalty_paid(&self) -> Amount {
        self.primary.saturating_add(self.secondary)
    }
}
