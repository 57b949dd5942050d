//! Property tests for the conservation invariant.
//!
//! Whatever the gross notional, royalty rate, share split, and dust
//! threshold, the generated value decomposition must sum back to the gross
//! exactly — integer equality, no epsilon.

use bazaar_settlement::{RoyaltySplit, SettlementGenerator};
use bazaar_types::{AccountId, Amount, RoyaltyConfig, TradeId, constants::LEDGER_NETWORK};
use proptest::prelude::*;

fn config(rate_bps: u16, primary_share_bps: u16) -> RoyaltyConfig {
    RoyaltyConfig {
        rate_bps,
        primary_recipient: AccountId::new(),
        primary_share_bps,
        secondary_recipient: AccountId::new(),
    }
}

proptest! {
    #[test]
    fn split_always_conserves(
        gross in 0u64..100_000_000,
        rate_bps in 0u16..=10_000,
        primary_share_bps in 0u16..=10_000,
        dust in 0u64..10_000,
    ) {
        let split = RoyaltySplit::compute(
            Amount::from_minor(gross),
            &config(rate_bps, primary_share_bps),
            Amount::from_minor(dust),
        );
        prop_assert!(split.conserves());
        // shares never exceed the royalty envelope
        prop_assert!(split.royalty_paid() <= Amount::from_minor(gross));
    }

    #[test]
    fn generated_trade_payments_conserve(
        gross in 1u64..100_000_000,
        rate_bps in 0u16..=10_000,
        primary_share_bps in 0u16..=10_000,
        dust in 0u64..10_000,
    ) {
        let generator = SettlementGenerator::new(
            config(rate_bps, primary_share_bps),
            Amount::from_minor(dust),
        )
        .unwrap();

        // trade_payments verifies conservation internally and errors on
        // any imbalance, so a clean return is the property.
        let payments = generator
            .trade_payments(
                TradeId::new(),
                AccountId::new(),
                AccountId::new(),
                Amount::from_minor(gross),
                LEDGER_NETWORK,
            )
            .unwrap();

        let total: u128 = payments.iter().map(|p| u128::from(p.amount.minor())).sum();
        prop_assert_eq!(total, u128::from(gross));
    }

    #[test]
    fn royalty_never_negative_principal(
        gross in 0u64..100_000_000,
        rate_bps in 0u16..=10_000,
    ) {
        let split = RoyaltySplit::compute(
            Amount::from_minor(gross),
            &config(rate_bps, 5_000),
            Amount::ZERO,
        );
        // principal = gross - royalty stays within [0, gross]
        prop_assert!(split.principal <= Amount::from_minor(gross));
    }
}
