//! One matching pass: a single page of the order book, one transaction.
//!
//! A pass re-reads the triggering order inside its own transaction, walks
//! one price-time-ordered page of crossing counter-orders, and commits the
//! fills, ledger moves, settlement payments, and trade records atomically.
//! A non-ACTIVE trigger is an idempotent no-op — duplicate and concurrent
//! triggers converge without a lock manager because every pass validates
//! its reads at commit.
//!
//! Draining a book larger than one page takes multiple sequential passes
//! chained by the returned cursor; the drain as a whole is not atomic, but
//! each committed page moves the system from one fully-valid state to the
//! next, so a crash between pages leaves no partial escrow.

use std::sync::Arc;

use bazaar_store::{MarketStore, PageCursor, Tx};
use bazaar_types::{
    Amount, EngineConfig, MarketError, Order, OrderId, OrderSide, OrderStatus, PaymentId,
    PaymentSource, Result, Token, Trade, TradeId, constants::LEDGER_NETWORK,
};
use chrono::Utc;

use bazaar_settlement::SettlementGenerator;

use crate::strategy::{FillContext, MatchStrategy, strategy_for};

/// Outcome of one matching pass.
#[derive(Debug)]
pub enum PassOutcome {
    /// The book is drained as far as this trigger goes.
    Done { trades: Vec<TradeId> },
    /// A full page was consumed and more candidates may remain.
    MoreWork {
        trades: Vec<TradeId>,
        cursor: PageCursor,
    },
}

/// The core pairing engine.
pub struct MatchEngine {
    store: Arc<MarketStore>,
    generator: SettlementGenerator,
    config: EngineConfig,
}

impl MatchEngine {
    /// Construct with a validated configuration.
    ///
    /// # Errors
    /// Returns [`MarketError::Configuration`] on invalid engine config.
    pub fn new(
        store: Arc<MarketStore>,
        generator: SettlementGenerator,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            generator,
            config,
        })
    }

    #[must_use]
    pub fn store(&self) -> &Arc<MarketStore> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn generator(&self) -> &SettlementGenerator {
        &self.generator
    }

    /// Run one matching pass for `order_id`, resuming at `cursor`.
    ///
    /// # Errors
    /// Returns [`MarketError::OrderNotFound`] for an unknown trigger, or
    /// any fatal settlement/store error. A stale (non-ACTIVE) trigger is
    /// **not** an error — it returns `Done` with no trades.
    pub fn match_pass(&self, order_id: OrderId, cursor: Option<PageCursor>) -> Result<PassOutcome> {
        self.store.run_tx(self.config.tx_retry_limit, |tx| {
            self.pass_in_tx(tx, order_id, cursor.as_ref())
        })
    }

    fn pass_in_tx(
        &self,
        tx: &mut Tx<'_>,
        order_id: OrderId,
        cursor: Option<&PageCursor>,
    ) -> Result<PassOutcome> {
        // Step 1: re-read the trigger inside the transaction.
        let mut trigger = tx
            .get_order(order_id)
            .ok_or(MarketError::OrderNotFound(order_id))?;
        if !trigger.is_active() {
            tracing::debug!(
                order = %order_id,
                status = %trigger.status,
                "trigger no longer active, pass is a no-op"
            );
            return Ok(PassOutcome::Done { trades: Vec::new() });
        }

        let token = tx.get_token(trigger.token)?;
        let strategy = strategy_for(token.phase);

        // Step 2: one bounded page of crossing counter-orders.
        let page = tx.crossing_page(&trigger, self.config.page_size, cursor);
        let page_len = page.len();
        let next_cursor = page.last().map(PageCursor::after);

        let mut trades = Vec::new();
        for candidate in page {
            if !trigger.is_active() {
                break;
            }
            // Step 3: skips. Terminal candidates cannot appear here — the
            // page is read in this transaction — but same-owner pairs and
            // phase-inadmissible candidates are walked over.
            if candidate.owner == trigger.owner {
                tracing::debug!(
                    owner = %trigger.owner,
                    trigger = %trigger.id,
                    candidate = %candidate.id,
                    "same-owner pair skipped"
                );
                continue;
            }
            if !strategy.admits_candidate(&candidate) {
                tracing::debug!(
                    strategy = strategy.name(),
                    candidate = %candidate.id,
                    "candidate not admissible for token phase"
                );
                continue;
            }

            match self.fill_pair(tx, &mut trigger, candidate, &token, strategy) {
                Ok(Some(trade_id)) => trades.push(trade_id),
                Ok(None) => {}
                // Step 5: a sub-dust pairing is skipped, never fatal.
                Err(MarketError::DustAmount { amount, threshold }) => {
                    tracing::debug!(%amount, %threshold, "dust pairing skipped");
                }
                Err(err) => return Err(err),
            }
        }

        // Steps 6 & 10 for the trigger itself: force-expire a sub-dust
        // remainder, refund a settled buy's leftover escrow.
        self.buy_epilogue(tx, &mut trigger)?;

        tx.put_order(trigger.clone());

        if page_len == self.config.page_size && trigger.is_active() {
            let cursor = next_cursor.ok_or_else(|| {
                MarketError::Internal("full page without a cursor position".into())
            })?;
            tracing::info!(
                order = %order_id,
                trades = trades.len(),
                "page consumed, more work may remain"
            );
            Ok(PassOutcome::MoreWork { trades, cursor })
        } else {
            tracing::info!(order = %order_id, trades = trades.len(), "pass complete");
            Ok(PassOutcome::Done { trades })
        }
    }

    /// Attempt one fill between the trigger and a candidate. Returns the
    /// trade id, or `None` when no quantity is fillable.
    fn fill_pair(
        &self,
        tx: &mut Tx<'_>,
        trigger: &mut Order,
        mut maker: Order,
        token: &Token,
        strategy: &dyn MatchStrategy,
    ) -> Result<Option<TradeId>> {
        // Step 4: resting-order price, min-remainder quantity, bounded by
        // what the buy side's escrow can still cover at that price.
        let price = strategy.trade_price(trigger, &maker);
        let (buy, sell): (&mut Order, &mut Order) = match trigger.side {
            OrderSide::Buy => (trigger, &mut maker),
            OrderSide::Sell => (&mut maker, trigger),
        };

        let affordable = buy.remaining_balance.affordable_units(price);
        let quantity = buy
            .remaining_qty()
            .min(sell.remaining_qty())
            .min(affordable);

        if quantity == 0 {
            // The buy side cannot cover one unit at this price; if its
            // escrow has decayed below dust, expire it in place so it
            // stops surfacing as a candidate.
            self.buy_epilogue(tx, buy)?;
            let maker_changed = !maker.is_active();
            if maker_changed {
                tx.put_order(maker);
            }
            return Ok(None);
        }

        let notional = price.notional(quantity)?;
        if notional < self.config.dust_threshold {
            return Err(MarketError::DustAmount {
                amount: notional,
                threshold: self.config.dust_threshold,
            });
        }

        // Step 6: apply the fill to both orders.
        let fill_seq = buy.filled;
        buy.record_fill(quantity)?;
        sell.record_fill(quantity)?;
        buy.consume_balance(notional)?;

        let trade_id = TradeId::deterministic(buy.id, sell.id, fill_seq);
        let ctx = FillContext {
            trade_id,
            buy_order: buy.id,
            sell_order: sell.id,
            buyer: buy.owner,
            seller: sell.owner,
            token,
            quantity,
            price,
            notional,
        };

        // Step 7: ledger moves, per token phase.
        strategy.apply_ledger(tx, &ctx)?;

        // Step 8: settlement payments and the immutable trade record.
        let payments = strategy.settle(&self.generator, &ctx)?;
        let payment_ids: Vec<PaymentId> = payments.iter().map(|p| p.id).collect();
        for payment in payments {
            tx.record_payment(payment)?;
        }
        tx.record_trade(Trade {
            id: trade_id,
            buy_order: ctx.buy_order,
            sell_order: ctx.sell_order,
            buyer: ctx.buyer,
            seller: ctx.seller,
            token: token.id,
            quantity,
            price,
            notional,
            executed_at: Utc::now(),
            payments: payment_ids,
        })?;

        tracing::info!(
            trade = %trade_id,
            strategy = strategy.name(),
            quantity,
            price = %price,
            notional = %notional,
            "trade matched"
        );

        // Steps 6 & 10 for the buy side of this fill.
        self.buy_epilogue(tx, buy)?;

        tx.put_order(maker);
        Ok(Some(trade_id))
    }

    /// Buy-side epilogue: refund a settled order's leftover escrow
    /// (buyers never pay for quantity they did not receive), and
    /// force-expire a still-active order whose remaining escrow fell
    /// below the dust threshold.
    fn buy_epilogue(&self, tx: &mut Tx<'_>, order: &mut Order) -> Result<()> {
        if order.side != OrderSide::Buy || order.remaining_balance.is_zero() {
            return Ok(());
        }
        if order.status == OrderStatus::Settled {
            self.refund_escrow(tx, order)?;
        } else if order.is_active() && order.remaining_balance < self.config.dust_threshold {
            tracing::debug!(
                order = %order.id,
                balance = %order.remaining_balance,
                "sub-dust remainder force-expired"
            );
            order.status = if order.filled == 0 {
                OrderStatus::Expired
            } else {
                OrderStatus::PartiallySettledAndCancelled
            };
            self.refund_escrow(tx, order)?;
        }
        Ok(())
    }

    fn refund_escrow(&self, tx: &mut Tx<'_>, order: &mut Order) -> Result<()> {
        let amount = order.remaining_balance;
        order.remaining_balance = Amount::ZERO;
        let refund = self.generator.refund(
            PaymentSource::Order(order.id),
            order.owner,
            amount,
            LEDGER_NETWORK,
        );
        tracing::debug!(order = %order.id, %amount, "unconsumed escrow refunded");
        tx.record_payment(refund)
    }
}
