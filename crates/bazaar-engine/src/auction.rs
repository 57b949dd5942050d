//! Ascending-price auctions on unique items.
//!
//! Structurally the same discipline as trade matching: every mutation is
//! one transaction, and the dangerous moment — replacing the highest bid —
//! refunds the outbid participant in the **same commit** that installs the
//! new bid, so no bidder's funds are ever simultaneously held and
//! un-refunded. Finalization is idempotent: a second invocation on a
//! FINALIZED item is a no-op.

use std::sync::Arc;

use bazaar_store::MarketStore;
use bazaar_types::{
    AccountId, Amount, AuctionState, Bid, BidId, EngineConfig, ItemId, MarketError, PaymentId,
    PaymentSource, Result, constants::LEDGER_NETWORK,
};
use chrono::{DateTime, Utc};

use bazaar_settlement::SettlementGenerator;

/// Result of an accepted bid.
#[derive(Debug)]
pub struct BidPlacement {
    pub bid: BidId,
    /// Refund intent for the outbid participant, when there was one.
    pub outbid_refund: Option<PaymentId>,
}

/// Result of a finalization attempt.
#[derive(Debug)]
pub enum FinalizeOutcome {
    Finalized {
        winner: Option<AccountId>,
        payments: Vec<PaymentId>,
    },
    /// The item was already finalized; nothing happened.
    AlreadyFinalized,
}

/// Single-item bid matching and finalization.
pub struct AuctionMatcher {
    store: Arc<MarketStore>,
    generator: SettlementGenerator,
    config: EngineConfig,
}

impl AuctionMatcher {
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

    /// Place a bid. Accepted only while the auction is open and the
    /// amount clears the current highest by at least the floor increment
    /// (a first bid must clear the increment itself).
    ///
    /// # Errors
    /// - [`MarketError::AuctionClosed`] past end time or after
    ///   finalization.
    /// - [`MarketError::BidTooLow`] below the required floor.
    pub fn place_bid(
        &self,
        item_id: ItemId,
        bidder: AccountId,
        amount: Amount,
        funding_ref: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<BidPlacement> {
        self.store.run_tx(self.config.tx_retry_limit, |tx| {
            let mut item = tx.get_item(item_id)?;
            if !item.accepts_bids(now) {
                return Err(MarketError::AuctionClosed(item_id));
            }

            let current_highest = match item.highest_bid {
                Some(bid_id) => Some(tx.get_bid(bid_id)?),
                None => None,
            };
            let required = match &current_highest {
                Some(bid) => bid.amount.checked_add(self.config.min_bid_increment)?,
                None => self.config.min_bid_increment,
            };
            if amount < required {
                return Err(MarketError::BidTooLow {
                    offered: amount,
                    required,
                });
            }

            // Outbid refund lands in the same commit as the new highest.
            let mut outbid_refund = None;
            if let Some(mut previous) = current_highest {
                previous.is_current_highest = false;
                let refund = self.generator.refund(
                    PaymentSource::Auction(item_id),
                    previous.bidder,
                    previous.amount,
                    LEDGER_NETWORK,
                );
                outbid_refund = Some(refund.id);
                tx.record_payment(refund)?;
                tracing::debug!(
                    item = %item_id,
                    outbid = %previous.bidder,
                    amount = %previous.amount,
                    "previous highest bidder refunded"
                );
                tx.put_bid(previous);
            }

            let mut bid = Bid::new(item_id, bidder, amount, funding_ref.clone());
            bid.is_current_highest = true;
            let bid_id = bid.id;

            item.highest_bid = Some(bid_id);
            item.state = AuctionState::Bidding;
            tx.put_bid(bid);
            tx.put_item(item);

            tracing::info!(
                item = %item_id,
                bid = %bid_id,
                %bidder,
                %amount,
                "bid accepted as current highest"
            );
            Ok(BidPlacement {
                bid: bid_id,
                outbid_refund,
            })
        })
    }

    /// Finalize an ended auction: ownership moves to the highest bidder
    /// and the previous owner is paid amount − royalty through the same
    /// split as trade settlement. An item with no bids finalizes with no
    /// payments and unchanged ownership.
    ///
    /// # Errors
    /// Returns [`MarketError::AuctionStillOpen`] before the end time.
    pub fn finalize(&self, item_id: ItemId, now: DateTime<Utc>) -> Result<FinalizeOutcome> {
        self.store.run_tx(self.config.tx_retry_limit, |tx| {
            let mut item = tx.get_item(item_id)?;
            if item.state == AuctionState::Finalized {
                tracing::debug!(item = %item_id, "already finalized, no-op");
                return Ok(FinalizeOutcome::AlreadyFinalized);
            }
            if now < item.ends_at {
                return Err(MarketError::AuctionStillOpen(item_id));
            }

            let Some(bid_id) = item.highest_bid else {
                item.state = AuctionState::Finalized;
                tx.put_item(item);
                tracing::info!(item = %item_id, "auction finalized with no bids");
                return Ok(FinalizeOutcome::Finalized {
                    winner: None,
                    payments: Vec::new(),
                });
            };

            let bid = tx.get_bid(bid_id)?;
            let payments = self.generator.auction_payments(
                item_id,
                bid.bidder,
                item.owner,
                bid.amount,
                LEDGER_NETWORK,
            )?;
            let payment_ids: Vec<PaymentId> = payments.iter().map(|p| p.id).collect();
            for payment in payments {
                tx.record_payment(payment)?;
            }

            let previous_owner = item.owner;
            item.owner = bid.bidder;
            item.state = AuctionState::Finalized;
            tx.put_item(item);

            tracing::info!(
                item = %item_id,
                winner = %bid.bidder,
                %previous_owner,
                amount = %bid.amount,
                "auction finalized"
            );
            Ok(FinalizeOutcome::Finalized {
                winner: Some(bid.bidder),
                payments: payment_ids,
            })
        })
    }
}
