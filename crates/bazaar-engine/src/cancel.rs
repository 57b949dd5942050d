//! Cancellation, forced cancellation, and expiry compensation.
//!
//! Terminating an open order unwinds its escrow in the same transaction
//! that moves it to a terminal status: a resting sell releases its
//! unfilled ledger lock, a resting buy gets a REFUND intent for the
//! unconsumed balance. An already-terminal order is returned unchanged —
//! the same idempotent no-op discipline the match pass uses, so duplicate
//! cancel requests and racing sweeps are harmless.

use std::sync::Arc;

use bazaar_store::MarketStore;
use bazaar_types::{
    AccountId, Amount, EngineConfig, ForcedReason, MarketError, Order, OrderId, OrderSide,
    OrderStatus, PaymentSource, Result, TokenId, constants::LEDGER_NETWORK,
};
use chrono::{DateTime, Utc};

use bazaar_settlement::SettlementGenerator;

/// Who asked for the termination, and with what authority.
#[derive(Debug, Clone, Copy)]
enum Disposition {
    /// Owner-requested; ownership is checked.
    Voluntary(AccountId),
    /// Administrative; bypasses the ownership check, carries a reason.
    Forced(ForcedReason),
    /// Past-expiry sweep.
    Expired,
}

/// Unwinds escrow when orders leave the book without (fully) settling.
pub struct CancellationCompensator {
    store: Arc<MarketStore>,
    generator: SettlementGenerator,
    config: EngineConfig,
}

impl CancellationCompensator {
    #[must_use]
    pub fn new(
        store: Arc<MarketStore>,
        generator: SettlementGenerator,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            generator,
            config,
        }
    }

    /// Owner-requested cancel.
    ///
    /// # Errors
    /// Returns [`MarketError::NotOrderOwner`] when `requested_by` does not
    /// own the order.
    pub fn cancel(&self, order_id: OrderId, requested_by: AccountId) -> Result<Order> {
        self.terminate(order_id, Disposition::Voluntary(requested_by))
    }

    /// Administrative cancel with an explicit reason tag.
    pub fn force_cancel(&self, order_id: OrderId, reason: ForcedReason) -> Result<Order> {
        self.terminate(order_id, Disposition::Forced(reason))
    }

    /// Expire one order (the sweep path, also usable directly).
    pub fn expire(&self, order_id: OrderId) -> Result<Order> {
        self.terminate(order_id, Disposition::Expired)
    }

    /// Expire every ACTIVE order past its expiry timestamp. One
    /// transaction per order — a crash mid-sweep leaves the remainder for
    /// the next run. Returns the ids actually expired.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<OrderId>> {
        let candidates = self.store.expired_active_orders(now);
        let mut swept = Vec::with_capacity(candidates.len());
        for order_id in candidates {
            let order = self.expire(order_id)?;
            if order.status.is_terminal() {
                swept.push(order_id);
            }
        }
        if !swept.is_empty() {
            tracing::info!(count = swept.len(), "expiry sweep complete");
        }
        Ok(swept)
    }

    /// Force-cancel every ACTIVE order of a token — the compensation run
    /// for an administrative token-state transition.
    pub fn force_cancel_token(&self, token: TokenId, reason: ForcedReason) -> Result<Vec<OrderId>> {
        let candidates = self.store.active_orders_for_token(token);
        let mut cancelled = Vec::with_capacity(candidates.len());
        for order_id in candidates {
            let order = self.force_cancel(order_id, reason)?;
            if order.status.is_terminal() {
                cancelled.push(order_id);
            }
        }
        tracing::warn!(
            token = %token,
            reason = %reason,
            count = cancelled.len(),
            "token orders force-cancelled"
        );
        Ok(cancelled)
    }

    fn terminate(&self, order_id: OrderId, disposition: Disposition) -> Result<Order> {
        self.store.run_tx(self.config.tx_retry_limit, |tx| {
            let mut order = tx
                .get_order(order_id)
                .ok_or(MarketError::OrderNotFound(order_id))?;

            if order.status.is_terminal() {
                tracing::debug!(
                    order = %order_id,
                    status = %order.status,
                    "already terminal, cancel is a no-op"
                );
                return Ok(order);
            }

            if let Disposition::Voluntary(requester) = disposition {
                if requester != order.owner {
                    return Err(MarketError::NotOrderOwner(order_id));
                }
            }

            let terminal = if order.filled == 0 {
                match disposition {
                    Disposition::Voluntary(_) => OrderStatus::Cancelled,
                    Disposition::Forced(reason) => OrderStatus::CancelledForced(reason),
                    Disposition::Expired => OrderStatus::Expired,
                }
            } else {
                OrderStatus::PartiallySettledAndCancelled
            };

            // Compensation: release the sell lock, refund the buy escrow.
            match order.side {
                OrderSide::Sell => {
                    let unfilled = order.remaining_qty();
                    if unfilled > 0 {
                        tx.ledger_release_lock(order.owner, order.token, unfilled)?;
                    }
                }
                OrderSide::Buy => {
                    if !order.remaining_balance.is_zero() {
                        let refund = self.generator.refund(
                            PaymentSource::Order(order_id),
                            order.owner,
                            order.remaining_balance,
                            LEDGER_NETWORK,
                        );
                        tx.record_payment(refund)?;
                        order.remaining_balance = Amount::ZERO;
                    }
                }
            }

            order.status = terminal;
            tx.put_order(order.clone());

            match disposition {
                Disposition::Forced(reason) => tracing::warn!(
                    order = %order_id,
                    %reason,
                    status = %order.status,
                    "order force-cancelled"
                ),
                _ => tracing::info!(
                    order = %order_id,
                    status = %order.status,
                    "order terminated"
                ),
            }
            Ok(order)
        })
    }
}
