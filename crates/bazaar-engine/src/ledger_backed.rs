//! Matching strategy for ledger-backed tokens.
//!
//! The plain case: units exist only as distribution-ledger rows, so a fill
//! is two row mutations (seller's locked units leave, buyer's ownership
//! grows) and the settlement payments are the standard
//! principal-plus-royalty split on the marketplace ledger.

use bazaar_store::Tx;
use bazaar_types::{Result, SettlementPayment, constants::LEDGER_NETWORK};

use bazaar_settlement::SettlementGenerator;

use crate::strategy::{FillContext, MatchStrategy};

pub struct LedgerBackedStrategy;

impl MatchStrategy for LedgerBackedStrategy {
    fn name(&self) -> &'static str {
        "ledger-backed"
    }

    fn apply_ledger(&self, tx: &mut Tx<'_>, ctx: &FillContext<'_>) -> Result<()> {
        tx.ledger_apply_sale(ctx.seller, ctx.token.id, ctx.quantity)?;
        tx.ledger_apply_purchase(ctx.buyer, ctx.token.id, ctx.quantity);
        Ok(())
    }

    fn settle(
        &self,
        generator: &SettlementGenerator,
        ctx: &FillContext<'_>,
    ) -> Result<Vec<SettlementPayment>> {
        generator.trade_payments(ctx.trade_id, ctx.buyer, ctx.seller, ctx.notional, LEDGER_NETWORK)
    }
}

#[cfg(test)]
mod tests {
    use bazaar_store::MarketStore;
    use bazaar_types::{
        AccountId, Amount, PaymentRole, RoyaltyConfig, Token, TokenPhase, TradeId,
    };

    use super::*;

    fn fill_ctx(token: &Token) -> (FillContext<'_>, AccountId, AccountId) {
        let buyer = AccountId::new();
        let seller = AccountId::new();
        let buy = bazaar_types::OrderId::new();
        let sell = bazaar_types::OrderId::new();
        (
            FillContext {
                trade_id: TradeId::deterministic(buy, sell, 0),
                buy_order: buy,
                sell_order: sell,
                buyer,
                seller,
                token,
                quantity: 5,
                price: Amount::from_minor(1_000),
                notional: Amount::from_minor(5_000),
            },
            buyer,
            seller,
        )
    }

    #[test]
    fn fill_moves_ledger_rows() {
        let store = MarketStore::new();
        let token = Token::new("GLD", TokenPhase::LedgerBacked, "ledger");
        store.insert_token(token.clone());
        let (ctx, buyer, seller) = fill_ctx(&token);

        store
            .run_tx(0, |tx| {
                tx.ledger_deposit(seller, token.id, 10);
                tx.ledger_lock_for_sale(seller, token.id, 10)?;
                LedgerBackedStrategy.apply_ledger(tx, &ctx)
            })
            .unwrap();

        let seller_row = store.ledger_row(seller, token.id);
        assert_eq!(seller_row.owned, 5);
        assert_eq!(seller_row.locked_for_sale, 5);
        assert_eq!(seller_row.sold, 5);

        let buyer_row = store.ledger_row(buyer, token.id);
        assert_eq!(buyer_row.owned, 5);
        assert_eq!(buyer_row.purchased, 5);
    }

    #[test]
    fn settlement_is_principal_plus_royalties() {
        let token = Token::new("GLD", TokenPhase::LedgerBacked, "ledger");
        let (ctx, _, seller) = fill_ctx(&token);
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

        let payments = LedgerBackedStrategy.settle(&generator, &ctx).unwrap();
        assert_eq!(payments.len(), 3);
        assert_eq!(payments[0].role, PaymentRole::Principal);
        assert_eq!(payments[0].payee, seller);
        assert_eq!(payments[0].amount, Amount::from_minor(4_875));
    }
}
