//! # bazaar-engine
//!
//! The TokenBazaar trade matching & settlement engine:
//!
//! - [`MatchEngine`] — the ten-step matching pass: one page of crossing
//!   counter-orders per serializable transaction, fills, ledger moves,
//!   settlement payments, and the immutable trade record committed
//!   atomically.
//! - Three interchangeable lifecycle strategies behind [`MatchStrategy`]:
//!   ledger-backed, base-currency swap, chain-issued.
//! - [`RerunDriver`] — the bounded page-at-a-time drain loop.
//! - [`CancellationCompensator`] — cancel / forced-cancel / expiry
//!   compensation and the periodic sweeps.
//! - [`AuctionMatcher`] — ascending-price bidding with same-transaction
//!   outbid refunds and idempotent finalization.
//!
//! The engine decides *what* should be paid to *whom*; payment intents
//! are handed to an external submission pipeline and the engine never
//! waits for confirmation.

pub mod auction;
pub mod base_swap;
pub mod cancel;
pub mod chain_issued;
pub mod driver;
pub mod ledger_backed;
pub mod match_pass;
pub mod strategy;

pub use auction::{AuctionMatcher, BidPlacement, FinalizeOutcome};
pub use base_swap::BaseSwapStrategy;
pub use cancel::CancellationCompensator;
pub use chain_issued::ChainIssuedStrategy;
pub use driver::{DrainSummary, RerunDriver};
pub use ledger_backed::LedgerBackedStrategy;
pub use match_pass::{MatchEngine, PassOutcome};
pub use strategy::{FillContext, MatchStrategy, strategy_for};
