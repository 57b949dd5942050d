//! Matching strategy for network-base-currency swaps.
//!
//! When the token is itself a network's base currency, a trade is a
//! cross-network currency exchange, not an asset sale:
//!
//! - candidates must carry a funding reference — the inbound leg on the
//!   counter network has to exist before the swap can settle,
//! - no royalty applies; the quote leg pays the seller the full gross,
//! - settlement emits **both legs** of the pair: the quote-leg principal
//!   on the marketplace ledger and the base-leg delivery intent on the
//!   token's own network.

use bazaar_store::Tx;
use bazaar_types::{Order, Result, SettlementPayment, constants::LEDGER_NETWORK};

use bazaar_settlement::SettlementGenerator;

use crate::strategy::{FillContext, MatchStrategy};

pub struct BaseSwapStrategy;

impl MatchStrategy for BaseSwapStrategy {
    fn name(&self) -> &'static str {
        "base-swap"
    }

    fn admits_candidate(&self, candidate: &Order) -> bool {
        candidate.funding_ref.is_some()
    }

    fn apply_ledger(&self, tx: &mut Tx<'_>, ctx: &FillContext<'_>) -> Result<()> {
        // Units are tracked locally while the swap legs settle out-of-band.
        tx.ledger_apply_sale(ctx.seller, ctx.token.id, ctx.quantity)?;
        tx.ledger_apply_purchase(ctx.buyer, ctx.token.id, ctx.quantity);
        Ok(())
    }

    fn settle(
        &self,
        generator: &SettlementGenerator,
        ctx: &FillContext<'_>,
    ) -> Result<Vec<SettlementPayment>> {
        let mut payments = generator.swap_principal(
            ctx.trade_id,
            ctx.buyer,
            ctx.seller,
            ctx.notional,
            LEDGER_NETWORK,
        )?;
        payments.push(generator.token_delivery(
            ctx.trade_id,
            ctx.seller,
            ctx.buyer,
            ctx.quantity,
            &ctx.token.network,
        ));
        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use bazaar_types::{
        AccountId, Amount, OrderSide, PaymentRole, RoyaltyConfig, Token, TokenPhase, TradeId,
    };

    use super::*;

    #[test]
    fn unfunded_candidates_are_filtered() {
        let mut candidate = Order::dummy(OrderSide::Sell, Amount::from_minor(100), 1);
        assert!(BaseSwapStrategy.admits_candidate(&candidate));
        candidate.funding_ref = None;
        assert!(!BaseSwapStrategy.admits_candidate(&candidate));
    }

    #[test]
    fn settlement_emits_both_legs_without_royalty() {
        let token = Token::new("NRG", TokenPhase::BaseSwap, "energychain");
        let buyer = AccountId::new();
        let seller = AccountId::new();
        let buy = bazaar_types::OrderId::new();
        let sell = bazaar_types::OrderId::new();
        let ctx = FillContext {
            trade_id: TradeId::deterministic(buy, sell, 0),
            buy_order: buy,
            sell_order: sell,
            buyer,
            seller,
            token: &token,
            quantity: 8,
            price: Amount::from_minor(500),
            notional: Amount::from_minor(4_000),
        };
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

        let payments = BaseSwapStrategy.settle(&generator, &ctx).unwrap();
        assert_eq!(payments.len(), 2);

        // Quote leg: full gross to the seller, no royalty taken.
        assert_eq!(payments[0].role, PaymentRole::Principal);
        assert_eq!(payments[0].payee, seller);
        assert_eq!(payments[0].amount, Amount::from_minor(4_000));
        assert_eq!(payments[0].route.network, LEDGER_NETWORK);

        // Base leg: unit delivery to the buyer on the token's network.
        assert_eq!(payments[1].payee, buyer);
        assert_eq!(payments[1].amount, Amount::from_minor(8));
        assert_eq!(payments[1].route.network, "energychain");
    }
}
