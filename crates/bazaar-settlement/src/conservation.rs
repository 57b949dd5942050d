//! Conservation guards.
//!
//! The invariant enforced for every settled trade:
//! ```text
//! Σ(principal + royalty payments) == gross notional, exactly
//! ```
//! Refunds are excluded — they return escrow that was never part of the
//! trade's notional. A violation means an arithmetic regression somewhere
//! in the split path; it must never occur in correct code, so it is a
//! fatal error, not a warning.

use bazaar_types::{
    Amount, DistributionRow, MarketError, PaymentRole, Result, SettlementPayment,
};

/// Verify that the non-refund payments on the settlement network sum
/// exactly to the trade notional.
///
/// # Errors
/// Returns [`MarketError::ConservationViolation`] if the sums differ.
pub fn verify_trade_payments(
    notional: Amount,
    payments: &[SettlementPayment],
    settlement_network: &str,
) -> Result<()> {
    let mut sum = Amount::ZERO;
    for payment in payments {
        if payment.role == PaymentRole::Refund || payment.route.network != settlement_network {
            continue;
        }
        sum = sum.checked_add(payment.amount)?;
    }
    if sum != notional {
        return Err(MarketError::ConservationViolation {
            expected: notional,
            actual: sum,
        });
    }
    Ok(())
}

/// Audit a set of distribution rows for the structural ledger invariant
/// (`locked_for_sale <= owned`). Used by housekeeping sweeps and tests.
///
/// # Errors
/// Returns the first row violation encountered.
pub fn audit_rows<'a>(rows: impl IntoIterator<Item = &'a DistributionRow>) -> Result<()> {
    for row in rows {
        row.check_invariant()?;
    }
    Ok(())
}
