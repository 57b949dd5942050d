//! Auction types: unique items and ascending-price bids.
//!
//! The auction state machine per item is `NO_BIDS -> BIDDING -> FINALIZED`.
//! At most one bid per item holds `is_current_highest`; the engine swaps
//! the flag and refunds the outbid participant inside one transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, BidId, ItemId};

/// Auction lifecycle of a unique item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionState {
    NoBids,
    Bidding,
    Finalized,
}

impl std::fmt::Display for AuctionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoBids => write!(f, "NO_BIDS"),
            Self::Bidding => write!(f, "BIDDING"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// A unique item under auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionItem {
    pub id: ItemId,
    pub owner: AccountId,
    pub state: AuctionState,
    /// Pointer to the bid currently holding `is_current_highest`.
    pub highest_bid: Option<BidId>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AuctionItem {
    #[must_use]
    pub fn new(owner: AccountId, ends_at: DateTime<Utc>) -> Self {
        Self {
            id: ItemId::new(),
            owner,
            state: AuctionState::NoBids,
            highest_bid: None,
            ends_at,
            created_at: Utc::now(),
        }
    }

    /// Whether bids are still accepted at `now`.
    #[must_use]
    pub fn accepts_bids(&self, now: DateTime<Utc>) -> bool {
        self.state != AuctionState::Finalized && now < self.ends_at
    }
}

/// A bid on a unique item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub item: ItemId,
    pub bidder: AccountId,
    pub amount: Amount,
    /// Exactly one bid per item holds this at any time.
    pub is_current_highest: bool,
    /// Reference to the inbound payment escrowing the bid amount.
    pub funding_ref: Option<String>,
    pub placed_at: DateTime<Utc>,
}

impl Bid {
    #[must_use]
    pub fn new(
        item: ItemId,
        bidder: AccountId,
        amount: Amount,
        funding_ref: Option<String>,
    ) -> Self {
        Self {
            id: BidId::new(),
            item,
            bidder,
            amount,
            is_current_highest: false,
            funding_ref,
            placed_at: Utc::now(),
        }
    }
}
