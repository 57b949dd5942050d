//! Matching strategy for chain-issued tokens.
//!
//! Units are issued natively on a chain, so buyer delivery is composed as
//! an on-chain transfer output rather than a local ledger-row increment:
//! the buyer row records `purchased` only — `owned` is credited by the
//! external pipeline when the transfer confirms — and the settlement set
//! carries a token-delivery intent next to the usual royalty split.
//!
//! Buy-side candidates must carry a payout route, or the delivery intent
//! would have nowhere to go.

use bazaar_store::Tx;
use bazaar_types::{Order, OrderSide, Result, SettlementPayment, constants::LEDGER_NETWORK};

use bazaar_settlement::SettlementGenerator;

use crate::strategy::{FillContext, MatchStrategy};

pub struct ChainIssuedStrategy;

impl MatchStrategy for ChainIssuedStrategy {
    fn name(&self) -> &'static str {
        "chain-issued"
    }

    fn admits_candidate(&self, candidate: &Order) -> bool {
        match candidate.side {
            OrderSide::Buy => candidate.payout_ref.is_some(),
            OrderSide::Sell => true,
        }
    }

    fn apply_ledger(&self, tx: &mut Tx<'_>, ctx: &FillContext<'_>) -> Result<()> {
        tx.ledger_apply_sale(ctx.seller, ctx.token.id, ctx.quantity)?;
        tx.ledger_record_purchase(ctx.buyer, ctx.token.id, ctx.quantity);
        Ok(())
    }

    fn settle(
        &self,
        generator: &SettlementGenerator,
        ctx: &FillContext<'_>,
    ) -> Result<Vec<SettlementPayment>> {
        let mut payments = generator.trade_payments(
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
    use bazaar_store::MarketStore;
    use bazaar_types::{AccountId, Amount, RoyaltyConfig, Token, TokenPhase, TradeId};

    use super::*;

    #[test]
    fn buy_candidates_need_payout_route() {
        let mut buy = Order::dummy(OrderSide::Buy, Amount::from_minor(100), 1);
        assert!(ChainIssuedStrategy.admits_candidate(&buy));
        buy.payout_ref = None;
        assert!(!ChainIssuedStrategy.admits_candidate(&buy));

        let mut sell = Order::dummy(OrderSide::Sell, Amount::from_minor(100), 1);
        sell.payout_ref = None;
        assert!(ChainIssuedStrategy.admits_candidate(&sell));
    }

    #[test]
    fn buyer_owned_is_not_credited_locally() {
        let store = MarketStore::new();
        let token = Token::new("ORE", TokenPhase::ChainIssued, "orechain");
        store.insert_token(token.clone());
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
            quantity: 4,
            price: Amount::from_minor(1_000),
            notional: Amount::from_minor(4_000),
        };

        store
            .run_tx(0, |tx| {
                tx.ledger_deposit(seller, token.id, 4);
                tx.ledger_lock_for_sale(seller, token.id, 4)?;
                ChainIssuedStrategy.apply_ledger(tx, &ctx)
            })
            .unwrap();

        let buyer_row = store.ledger_row(buyer, token.id);
        assert_eq!(buyer_row.purchased, 4);
        assert_eq!(buyer_row.owned, 0);

        let seller_row = store.ledger_row(seller, token.id);
        assert_eq!(seller_row.sold, 4);
        assert_eq!(seller_row.owned, 0);
    }

    #[test]
    fn settlement_appends_delivery_intent() {
        let token = Token::new("ORE", TokenPhase::ChainIssued, "orechain");
        let buyer = AccountId::new();
        let buy = bazaar_types::OrderId::new();
        let sell = bazaar_types::OrderId::new();
        let ctx = FillContext {
            trade_id: TradeId::deterministic(buy, sell, 0),
            buy_order: buy,
            sell_order: sell,
            buyer,
            seller: AccountId::new(),
            token: &token,
            quantity: 4,
            price: Amount::from_minor(1_000),
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

        let payments = ChainIssuedStrategy.settle(&generator, &ctx).unwrap();
        // principal + two royalties + delivery
        assert_eq!(payments.len(), 4);
        let delivery = payments.last().unwrap();
        assert_eq!(delivery.route.network, "orechain");
        assert_eq!(delivery.payee, buyer);
        assert_eq!(delivery.amount, Amount::from_minor(4));
    }
}
