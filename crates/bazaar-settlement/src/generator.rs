//! The settlement generator: builds payment intents from fills.
//!
//! Pure and deterministic given its inputs — it returns payment
//! descriptors and never touches a store, which keeps every composition
//! rule testable without transactional scaffolding. Persistence is the
//! caller's job.
//!
//! The `payer` of a payment identifies whose escrow is drawn; a refund is
//! therefore payer == payee: escrowed funds returning to their owner's
//! wallet.

use bazaar_types::{
    AccountId, Amount, ItemId, PaymentId, PaymentRole, PaymentRoute, PaymentSource, Result,
    RoyaltyConfig, SettlementPayment, TradeId,
};

use crate::conservation::verify_trade_payments;
use crate::royalty::RoyaltySplit;

// Deterministic payment-id positions within one trade's settlement set.
const SEQ_PRINCIPAL: u8 = 0;
const SEQ_ROYALTY_PRIMARY: u8 = 1;
const SEQ_ROYALTY_SECONDARY: u8 = 2;
const SEQ_REFUND: u8 = 3;
const SEQ_TOKEN_LEG: u8 = 4;

/// Builds settlement payments for trades, auctions, and compensations.
#[derive(Debug, Clone)]
pub struct SettlementGenerator {
    royalty: RoyaltyConfig,
    dust_threshold: Amount,
}

impl SettlementGenerator {
    /// Construct with validated royalty configuration.
    ///
    /// # Errors
    /// Returns [`bazaar_types::MarketError::Configuration`] on invalid
    /// basis-point fields.
    pub fn new(royalty: RoyaltyConfig, dust_threshold: Amount) -> Result<Self> {
        royalty.validate()?;
        Ok(Self {
            royalty,
            dust_threshold,
        })
    }

    #[must_use]
    pub fn dust_threshold(&self) -> Amount {
        self.dust_threshold
    }

    #[must_use]
    pub fn royalty_config(&self) -> &RoyaltyConfig {
        &self.royalty
    }

    /// Principal + royalty payments for a trade: buyer's escrow pays the
    /// seller gross − royalty, and the two royalty beneficiaries their
    /// split. Conservation-checked before returning.
    pub fn trade_payments(
        &self,
        trade: TradeId,
        buyer: AccountId,
        seller: AccountId,
        notional: Amount,
        network: &str,
    ) -> Result<Vec<SettlementPayment>> {
        let payments = self.split_payments(
            PaymentSource::Trade(trade),
            buyer,
            seller,
            notional,
            network,
            |seq| PaymentId::deterministic(trade, seq),
        )?;
        verify_trade_payments(notional, &payments, network)?;
        Ok(payments)
    }

    /// Full-notional principal for a base-currency swap: a currency
    /// exchange carries no royalty; the quote leg pays the seller the
    /// whole gross.
    pub fn swap_principal(
        &self,
        trade: TradeId,
        buyer: AccountId,
        seller: AccountId,
        notional: Amount,
        network: &str,
    ) -> Result<Vec<SettlementPayment>> {
        let route = self.routed(PaymentRoute::network(network), notional);
        let payments = vec![SettlementPayment::new(
            PaymentId::deterministic(trade, SEQ_PRINCIPAL),
            buyer,
            seller,
            notional,
            PaymentRole::Principal,
            PaymentSource::Trade(trade),
            route,
        )];
        verify_trade_payments(notional, &payments, network)?;
        Ok(payments)
    }

    /// Token-side delivery leg: the intent to move `units` token units to
    /// the buyer on the token's own network. The amount is denominated in
    /// token units — the route's network tag tells the pipeline which
    /// unit domain applies.
    #[must_use]
    pub fn token_delivery(
        &self,
        trade: TradeId,
        seller: AccountId,
        buyer: AccountId,
        units: u64,
        token_network: &str,
    ) -> SettlementPayment {
        SettlementPayment::new(
            PaymentId::deterministic(trade, SEQ_TOKEN_LEG),
            seller,
            buyer,
            Amount::from_minor(units),
            PaymentRole::Principal,
            PaymentSource::Trade(trade),
            PaymentRoute::network(token_network)
                .with_memo(serde_json::json!({ "kind": "token-delivery" })),
        )
    }

    /// A refund of unconsumed escrow back to its owner. Trade-sourced
    /// refunds get a deterministic id; cancellation and auction refunds
    /// are generated fresh.
    #[must_use]
    pub fn refund(
        &self,
        source: PaymentSource,
        account: AccountId,
        amount: Amount,
        network: &str,
    ) -> SettlementPayment {
        let id = match source {
            PaymentSource::Trade(trade) => PaymentId::deterministic(trade, SEQ_REFUND),
            PaymentSource::Order(_) | PaymentSource::Auction(_) => PaymentId::new(),
        };
        let route = self.routed(PaymentRoute::network(network), amount);
        SettlementPayment::new(
            id,
            account,
            account,
            amount,
            PaymentRole::Refund,
            source,
            route,
        )
    }

    /// Principal + royalty payments for an auction finalization: the
    /// winner's escrow pays the item owner amount − royalty.
    pub fn auction_payments(
        &self,
        item: ItemId,
        winner: AccountId,
        owner: AccountId,
        amount: Amount,
        network: &str,
    ) -> Result<Vec<SettlementPayment>> {
        let payments = self.split_payments(
            PaymentSource::Auction(item),
            winner,
            owner,
            amount,
            network,
            |_| PaymentId::new(),
        )?;
        verify_trade_payments(amount, &payments, network)?;
        Ok(payments)
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn split_payments(
        &self,
        source: PaymentSource,
        payer: AccountId,
        payee: AccountId,
        notional: Amount,
        network: &str,
        make_id: impl Fn(u8) -> PaymentId,
    ) -> Result<Vec<SettlementPayment>> {
        let split = RoyaltySplit::compute(notional, &self.royalty, self.dust_threshold);
        if !split.folded_dust.is_zero() {
            tracing::debug!(
                folded = %split.folded_dust,
                gross = %notional,
                "royalty dust folded into principal"
            );
        }

        let mut payments = Vec::with_capacity(3);
        if !split.principal.is_zero() {
            payments.push(SettlementPayment::new(
                make_id(SEQ_PRINCIPAL),
                payer,
                payee,
                split.principal,
                PaymentRole::Principal,
                source,
                self.routed(PaymentRoute::network(network), split.principal),
            ));
        }
        if !split.primary.is_zero() {
            payments.push(SettlementPayment::new(
                make_id(SEQ_ROYALTY_PRIMARY),
                payer,
                self.royalty.primary_recipient,
                split.primary,
                PaymentRole::Royalty,
                source,
                PaymentRoute::network(network),
            ));
        }
        if !split.secondary.is_zero() {
            payments.push(SettlementPayment::new(
                make_id(SEQ_ROYALTY_SECONDARY),
                payer,
                self.royalty.secondary_recipient,
                split.secondary,
                PaymentRole::Royalty,
                source,
                PaymentRoute::network(network),
            ));
        }
        Ok(payments)
    }

    /// Flag a route when its amount cannot be paid out on-network.
    fn routed(&self, route: PaymentRoute, amount: Amount) -> PaymentRoute {
        if !amount.is_zero() && amount < self.dust_threshold {
            route.flagged_below_dust()
        } else {
            route
        }
    }
}
