//! Distribution-ledger row: per-(account, token) bookkeeping.
//!
//! Rows are upserted by increment — a missing row reads as all-zero and is
//! created by its first mutation. Every mutation preserves the structural
//! invariant `locked_for_sale <= owned`; `owned` only moves through
//! deposits, purchases, and sale settlement, never through direct
//! overwrite.

use serde::{Deserialize, Serialize};

use crate::{MarketError, Result};

/// Per-(account, token) distribution counters, all in token units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRow {
    /// Units currently owned.
    pub owned: u64,
    /// Units reserved against open sell orders.
    pub locked_for_sale: u64,
    /// Lifetime units bought through the engine.
    pub purchased: u64,
    /// Lifetime units sold through the engine.
    pub sold: u64,
    /// Lifetime units received from the intake flow.
    pub deposited: u64,
}

impl DistributionRow {
    /// A fresh all-zero row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Units owned but not reserved by an open sell order.
    #[must_use]
    pub fn available(&self) -> u64 {
        self.owned.saturating_sub(self.locked_for_sale)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Intake deposit: credits both `owned` and the lifetime counter.
    pub fn deposit(&mut self, qty: u64) {
        self.owned += qty;
        self.deposited += qty;
    }

    /// Reserve `qty` units against a new sell order.
    ///
    /// # Errors
    /// Returns [`MarketError::LockExceedsOwned`] if the reservation would
    /// exceed the owned quantity.
    pub fn lock_for_sale(&mut self, qty: u64) -> Result<()> {
        let locked = self.locked_for_sale + qty;
        if locked > self.owned {
            return Err(MarketError::LockExceedsOwned {
                locked: self.locked_for_sale,
                delta: qty,
                owned: self.owned,
            });
        }
        self.locked_for_sale = locked;
        Ok(())
    }

    /// Release `qty` units of an unfilled sell reservation
    /// (cancellation / expiry compensation).
    ///
    /// # Errors
    /// Returns [`MarketError::QuantityUnderflow`] if fewer units are locked.
    pub fn release_lock(&mut self, qty: u64) -> Result<()> {
        if self.locked_for_sale < qty {
            return Err(MarketError::QuantityUnderflow {
                have: self.locked_for_sale,
                need: qty,
            });
        }
        self.locked_for_sale -= qty;
        Ok(())
    }

    /// Seller-side settlement of a fill: the locked units leave the
    /// reservation and the ownership count, and the lifetime `sold`
    /// counter grows.
    ///
    /// # Errors
    /// Returns [`MarketError::QuantityUnderflow`] if the row does not hold
    /// `qty` locked (and therefore owned) units.
    pub fn apply_sale(&mut self, qty: u64) -> Result<()> {
        if self.locked_for_sale < qty {
            return Err(MarketError::QuantityUnderflow {
                have: self.locked_for_sale,
                need: qty,
            });
        }
        if self.owned < qty {
            return Err(MarketError::QuantityUnderflow {
                have: self.owned,
                need: qty,
            });
        }
        self.locked_for_sale -= qty;
        self.owned -= qty;
        self.sold += qty;
        Ok(())
    }

    /// Buyer-side settlement of a fill: ownership and the lifetime
    /// `purchased` counter grow together.
    pub fn apply_purchase(&mut self, qty: u64) {
        self.owned += qty;
        self.purchased += qty;
    }

    /// Counter-only purchase record for chain-issued tokens: the units are
    /// delivered on-chain by the external pipeline, so local `owned` is
    /// credited on confirmation, not here.
    pub fn record_purchase(&mut self, qty: u64) {
        self.purchased += qty;
    }

    /// Structural invariant check. Every public mutation maintains this;
    /// it exists as a guard for audit sweeps over persisted rows.
    ///
    /// # Errors
    /// Returns [`MarketError::LockExceedsOwned`] on a corrupt row.
    pub fn check_invariant(&self) -> Result<()> {
        if self.locked_for_sale > self.owned {
            return Err(MarketError::LockExceedsOwned {
                locked: self.locked_for_sale,
                delta: 0,
                owned: self.owned,
            });
        }
        Ok(())
    }
}
