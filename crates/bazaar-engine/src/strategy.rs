//! The matching-strategy seam.
//!
//! The ten shared steps of a matching pass live in the engine; what varies
//! with a token's lifecycle phase is consolidated behind this one trait
//! instead of branching at call sites:
//!
//! - which candidates the crossing query admits beyond price and status,
//! - the execution-price rule for a pairing,
//! - how a fill lands on the distribution ledger,
//! - the shape of the settlement payments it produces.
//!
//! All three strategies price at the **resting order's limit** — the
//! default on the trait. The source system's base-swap variant priced one
//! leg differently; that inconsistency was a latent bug, not behavior to
//! keep.

use bazaar_store::Tx;
use bazaar_types::{
    AccountId, Amount, Order, OrderId, Result, SettlementPayment, Token, TokenPhase, TradeId,
};

use bazaar_settlement::SettlementGenerator;

use crate::{
    base_swap::BaseSwapStrategy, chain_issued::ChainIssuedStrategy,
    ledger_backed::LedgerBackedStrategy,
};

/// Everything a strategy needs to know about one fill.
#[derive(Debug)]
pub struct FillContext<'a> {
    pub trade_id: TradeId,
    pub buy_order: OrderId,
    pub sell_order: OrderId,
    pub buyer: AccountId,
    pub seller: AccountId,
    pub token: &'a Token,
    /// Executed quantity in token units.
    pub quantity: u64,
    /// Execution price per unit.
    pub price: Amount,
    /// `quantity × price` in minor units.
    pub notional: Amount,
}

/// One token-lifecycle matching variant.
pub trait MatchStrategy: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &'static str;

    /// Query refinement: whether a price-crossing ACTIVE candidate is
    /// admissible for this lifecycle phase.
    fn admits_candidate(&self, candidate: &Order) -> bool {
        let _ = candidate;
        true
    }

    /// The execution price for a taker/maker pairing. The resting order's
    /// limit, for every phase.
    fn trade_price(&self, taker: &Order, maker: &Order) -> Amount {
        let _ = taker;
        maker.price
    }

    /// Land a fill on the distribution ledger.
    fn apply_ledger(&self, tx: &mut Tx<'_>, ctx: &FillContext<'_>) -> Result<()>;

    /// Compose the settlement payments for a fill.
    fn settle(
        &self,
        generator: &SettlementGenerator,
        ctx: &FillContext<'_>,
    ) -> Result<Vec<SettlementPayment>>;
}

/// Select the strategy for a token's lifecycle phase, once per pass.
#[must_use]
pub fn strategy_for(phase: TokenPhase) -> &'static dyn MatchStrategy {
    match phase {
        TokenPhase::LedgerBacked => &LedgerBackedStrategy,
        TokenPhase::BaseSwap => &BaseSwapStrategy,
        TokenPhase::ChainIssued => &ChainIssuedStrategy,
    }
}

#[cfg(test)]
mod tests {
    use bazaar_types::OrderSide;

    use super::*;

    #[test]
    fn selection_by_phase() {
        assert_eq!(strategy_for(TokenPhase::LedgerBacked).name(), "ledger-backed");
        assert_eq!(strategy_for(TokenPhase::BaseSwap).name(), "base-swap");
        assert_eq!(strategy_for(TokenPhase::ChainIssued).name(), "chain-issued");
    }

    #[test]
    fn default_price_rule_is_maker_price() {
        let taker = Order::dummy(OrderSide::Buy, Amount::from_minor(150), 1);
        let maker = Order::dummy(OrderSide::Sell, Amount::from_minor(100), 1);
        for phase in [
            TokenPhase::LedgerBacked,
            TokenPhase::BaseSwap,
            TokenPhase::ChainIssued,
        ] {
            assert_eq!(
                strategy_for(phase).trade_price(&taker, &maker),
                Amount::from_minor(100),
                "{phase} must use the resting order's price"
            );
        }
    }
}
