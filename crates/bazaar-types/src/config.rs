//! Configuration for the matching and settlement engine.
//!
//! Royalty percentages and recipient identities are injected as explicit
//! configuration — constructed once, passed into the settlement generator —
//! never read from ambient global state.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, MarketError, Result, constants};

/// Royalty configuration: the rate taken from every trade's gross
/// notional and the two beneficiaries it is split between.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoyaltyConfig {
    /// Royalty rate over gross notional, in basis points.
    pub rate_bps: u16,
    /// First beneficiary — receives `ceil(royalty × primary_share_bps)`.
    pub primary_recipient: AccountId,
    /// Primary beneficiary's share of the royalty total, in basis points.
    pub primary_share_bps: u16,
    /// Second beneficiary — receives the remainder by subtraction, so the
    /// two shares always sum exactly to the royalty total.
    pub secondary_recipient: AccountId,
}

impl RoyaltyConfig {
    /// Validate the basis-point fields.
    ///
    /// # Errors
    /// Returns [`MarketError::Configuration`] if either rate exceeds
    /// 10 000 bps.
    pub fn validate(&self) -> Result<()> {
        if u64::from(self.rate_bps) > constants::BPS_DENOMINATOR {
            return Err(MarketError::Configuration(format!(
                "royalty rate {} bps exceeds {}",
                self.rate_bps,
                constants::BPS_DENOMINATOR
            )));
        }
        if u64::from(self.primary_share_bps) > constants::BPS_DENOMINATOR {
            return Err(MarketError::Configuration(format!(
                "primary share {} bps exceeds {}",
                self.primary_share_bps,
                constants::BPS_DENOMINATOR
            )));
        }
        Ok(())
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Counter-order page size per matching transaction.
    pub page_size: usize,
    /// Rerun-driver pass budget per triggering order.
    pub max_passes: u32,
    /// Minimum transferable amount; smaller transfers are folded back or
    /// force-expired.
    pub dust_threshold: Amount,
    /// Minimum amount a new bid must exceed the current highest by.
    pub min_bid_increment: Amount,
    /// Optimistic-transaction retry budget.
    pub tx_retry_limit: u32,
}

impl EngineConfig {
    /// Validate the structural fields.
    ///
    /// # Errors
    /// Returns [`MarketError::Configuration`] on a zero page size or pass
    /// budget.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(MarketError::Configuration("page_size must be > 0".into()));
        }
        if self.max_passes == 0 {
            return Err(MarketError::Configuration("max_passes must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: constants::DEFAULT_PAGE_SIZE,
            max_passes: constants::DEFAULT_MAX_PASSES,
            dust_threshold: Amount::from_minor(constants::DEFAULT_DUST_THRESHOLD_MINOR),
            min_bid_increment: Amount::from_minor(constants::DEFAULT_MIN_BID_INCREMENT_MINOR),
            tx_retry_limit: constants::DEFAULT_TX_RETRY_LIMIT,
        }
    }
}
