//! The bounded rerun driver.
//!
//! Repeats [`MatchEngine::match_pass`] while it reports more work,
//! threading the page cursor between passes, up to the configured pass
//! budget. Exhausting the budget is the fatal
//! [`MarketError::RetryBudgetExceeded`] — a pathological book state that
//! must reach an operator, never be silently absorbed.
//!
//! Concurrent drains of the same order converge: every pass is atomic and
//! treats a non-ACTIVE trigger as a no-op, so duplicate triggers cannot
//! double-settle.

use bazaar_types::{MarketError, OrderId, Result, TradeId};

use crate::match_pass::{MatchEngine, PassOutcome};

/// What a completed drain produced.
#[derive(Debug)]
pub struct DrainSummary {
    pub trades: Vec<TradeId>,
    pub passes: u32,
}

/// Bounded page-at-a-time drain loop over a match engine.
pub struct RerunDriver<'a> {
    engine: &'a MatchEngine,
}

impl<'a> RerunDriver<'a> {
    #[must_use]
    pub fn new(engine: &'a MatchEngine) -> Self {
        Self { engine }
    }

    /// Drain the book for `order_id` until no further matches are
    /// possible or the pass budget runs out.
    ///
    /// # Errors
    /// Returns [`MarketError::RetryBudgetExceeded`] when the budget is
    /// exhausted with work still remaining, or any error a pass surfaced.
    pub fn drain(&self, order_id: OrderId) -> Result<DrainSummary> {
        let budget = self.engine.config().max_passes;
        let mut cursor = None;
        let mut trades = Vec::new();

        for pass in 1..=budget {
            match self.engine.match_pass(order_id, cursor.take())? {
                PassOutcome::Done { trades: produced } => {
                    trades.extend(produced);
                    tracing::info!(
                        order = %order_id,
                        passes = pass,
                        trades = trades.len(),
                        "drain complete"
                    );
                    return Ok(DrainSummary { trades, passes: pass });
                }
                PassOutcome::MoreWork {
                    trades: produced,
                    cursor: next,
                } => {
                    trades.extend(produced);
                    cursor = Some(next);
                }
            }
        }

        tracing::warn!(
            order = %order_id,
            budget,
            "pass budget exhausted with work remaining"
        );
        Err(MarketError::RetryBudgetExceeded {
            order: order_id,
            passes: budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bazaar_settlement::SettlementGenerator;
    use bazaar_store::MarketStore;
    use bazaar_types::{
        AccountId, Amount, EngineConfig, Order, OrderSide, RoyaltyConfig, Token, TokenPhase,
    };

    use super::*;

    fn engine_with(page_size: usize, max_passes: u32) -> (MatchEngine, Token) {
        let store = Arc::new(MarketStore::new());
        let token = Token::new("GLD", TokenPhase::LedgerBacked, "ledger");
        store.insert_token(token.clone());
        let generator = SettlementGenerator::new(
            RoyaltyConfig {
                rate_bps: 250,
                primary_recipient: AccountId::new(),
                primary_share_bps: 6_000,
                secondary_recipient: AccountId::new(),
            },
            Amount::from_minor(10),
        )
        .unwrap();
        let config = EngineConfig {
            page_size,
            max_passes,
            dust_threshold: Amount::from_minor(10),
            ..EngineConfig::default()
        };
        (MatchEngine::new(store, generator, config).unwrap(), token)
    }

    fn list_sells(engine: &MatchEngine, token: &Token, count: usize) {
        for _ in 0..count {
            let order = Order::dummy_for(
                AccountId::new(),
                token.id,
                OrderSide::Sell,
                Amount::from_minor(1_000),
                1,
            );
            engine
                .store()
                .run_tx(0, |tx| {
                    tx.ledger_deposit(order.owner, token.id, 1);
                    tx.ledger_lock_for_sale(order.owner, token.id, 1)?;
                    tx.create_order(order.clone())
                })
                .unwrap();
        }
    }

    fn place_buy(engine: &MatchEngine, token: &Token, qty: u64) -> bazaar_types::OrderId {
        let order = Order::dummy_for(
            AccountId::new(),
            token.id,
            OrderSide::Buy,
            Amount::from_minor(1_000),
            qty,
        );
        let id = order.id;
        engine
            .store()
            .run_tx(0, |tx| tx.create_order(order.clone()))
            .unwrap();
        id
    }

    #[test]
    fn multi_page_book_drains_across_passes() {
        let (engine, token) = engine_with(3, 8);
        list_sells(&engine, &token, 7);
        let buy = place_buy(&engine, &token, 7);

        let summary = RerunDriver::new(&engine).drain(buy).unwrap();
        assert_eq!(summary.trades.len(), 7);
        // 3 + 3 + 1: the third page is short, so three passes suffice.
        assert_eq!(summary.passes, 3);
    }

    #[test]
    fn budget_exhaustion_is_fatal() {
        let (engine, token) = engine_with(2, 1);
        list_sells(&engine, &token, 6);
        let buy = place_buy(&engine, &token, 6);

        let err = RerunDriver::new(&engine).drain(buy).unwrap_err();
        assert!(matches!(
            err,
            MarketError::RetryBudgetExceeded { passes: 1, .. }
        ));
    }

    #[test]
    fn duplicate_drains_converge() {
        let (engine, token) = engine_with(8, 8);
        list_sells(&engine, &token, 2);
        let buy = place_buy(&engine, &token, 2);

        let first = RerunDriver::new(&engine).drain(buy).unwrap();
        assert_eq!(first.trades.len(), 2);

        // A duplicate trigger finds a settled order: clean no-op.
        let second = RerunDriver::new(&engine).drain(buy).unwrap();
        assert!(second.trades.is_empty());
        assert_eq!(second.passes, 1);
    }
}
