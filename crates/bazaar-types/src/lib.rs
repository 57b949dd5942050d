//! # bazaar-types
//!
//! Shared types, errors, and configuration for the **TokenBazaar**
//! matching and settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`AccountId`], [`TokenId`], [`ItemId`],
//!   [`TradeId`], [`PaymentId`], [`BidId`]
//! - **Money**: [`Amount`] — integer minor units, checked arithmetic
//! - **Order model**: [`Order`], [`OrderSide`], [`OrderStatus`], [`ForcedReason`]
//! - **Trade model**: [`Trade`]
//! - **Settlement model**: [`SettlementPayment`], [`PaymentRole`], [`PaymentRoute`], [`PaymentSource`]
//! - **Ledger model**: [`DistributionRow`]
//! - **Auction model**: [`AuctionItem`], [`AuctionState`], [`Bid`]
//! - **Token model**: [`Token`], [`TokenPhase`]
//! - **Configuration**: [`RoyaltyConfig`], [`EngineConfig`]
//! - **Errors**: [`MarketError`] with `BZR_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod amount;
pub mod auction;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod order;
pub mod payment;
pub mod token;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use bazaar_types::{Order, OrderSide, Trade, Amount, ...};

pub use amount::*;
pub use auction::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;
pub use order::*;
pub use payment::*;
pub use token::*;
pub use trade::*;

// Constants are accessed via `bazaar_types::constants::FOO`
// (not re-exported to avoid name collisions).
