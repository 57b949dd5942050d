//! # bazaar-store
//!
//! The transactional substrate of the TokenBazaar engine:
//!
//! - [`MarketStore`] — strongly-typed tables for orders, trades, payments,
//!   distribution-ledger rows, tokens, auction items, and bids.
//! - [`Tx`] — optimistic serializable transactions: read-version
//!   validation at commit, staged read-your-writes, bounded retry via
//!   [`MarketStore::run_tx`].
//! - Distribution-ledger operations (upsert-by-increment, `locked <=
//!   owned` enforced on every mutation).
//! - The price-time-priority crossing query with [`PageCursor`]
//!   resumption for multi-page drains.
//!
//! The store is in-memory; the transaction surface is the contract a
//! persistent backend would have to honor (serializable multi-record
//! transactions with conditional read-then-write semantics).

pub mod ledger;
pub mod query;
pub mod store;

pub use query::PageCursor;
pub use store::{MarketStore, Tx};
