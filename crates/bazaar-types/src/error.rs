//! Error types for the TokenBazaar engine.
//!
//! All errors use the `BZR_ERR_` prefix convention for easy grepping in
//! logs. Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Ledger / escrow errors
//! - 3xx: Settlement errors
//! - 4xx: Matching errors
//! - 5xx: Auction errors
//! - 6xx: Store / transaction errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Amount, BidId, ItemId, OrderId, PaymentId, TokenId, TradeId};

/// Central error enum for all TokenBazaar operations.
#[derive(Debug, Error)]
pub enum MarketError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order was not found in the store.
    #[error("BZR_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with this ID already exists.
    #[error("BZR_ERR_101: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// A voluntary cancel was requested by someone other than the owner.
    #[error("BZR_ERR_102: Cancel rejected: requester does not own order {0}")]
    NotOrderOwner(OrderId),

    /// A fill would push `filled` past the requested quantity.
    #[error("BZR_ERR_103: Overfill on order {order}: filled {filled} + {delta} > requested {requested}")]
    Overfill {
        order: OrderId,
        filled: u64,
        delta: u64,
        requested: u64,
    },

    // =================================================================
    // Ledger / Escrow Errors (2xx)
    // =================================================================
    /// A balance operation would produce a negative value.
    #[error("BZR_ERR_200: Ledger underflow: have {have}, need {need}")]
    LedgerUnderflow { have: Amount, need: Amount },

    /// A lock would exceed the owned quantity.
    #[error("BZR_ERR_201: Lock exceeds owned: locked {locked} + {delta} > owned {owned}")]
    LockExceedsOwned { locked: u64, delta: u64, owned: u64 },

    /// A quantity operation would drop a ledger counter below zero.
    #[error("BZR_ERR_202: Quantity underflow: have {have}, need {need}")]
    QuantityUnderflow { have: u64, need: u64 },

    /// A buy fill requires more escrowed balance than the order holds.
    #[error("BZR_ERR_203: Insufficient escrow: need {need}, escrowed {escrowed}")]
    InsufficientEscrow { need: Amount, escrowed: Amount },

    // =================================================================
    // Settlement Errors (3xx)
    // =================================================================
    /// A trade with this ID was already recorded (idempotency anchor).
    #[error("BZR_ERR_300: Trade already recorded: {0}")]
    DuplicateTrade(TradeId),

    /// A payment with this ID was already recorded.
    #[error("BZR_ERR_301: Payment already recorded: {0}")]
    DuplicatePayment(PaymentId),

    /// Generated payments do not sum to the trade notional — fatal
    /// internal assertion guarding against arithmetic regressions.
    #[error("BZR_ERR_302: Conservation violation: payments sum to {actual}, notional is {expected}")]
    ConservationViolation { expected: Amount, actual: Amount },

    // =================================================================
    // Matching Errors (4xx)
    // =================================================================
    /// The order was no longer ACTIVE on re-read. Expected race; callers
    /// treat this as a skip, never as a failure.
    #[error("BZR_ERR_400: Stale order state: {0} is no longer active")]
    StaleOrder(OrderId),

    /// A computed transfer fell below the minimum transferable unit.
    /// Per-pairing skip, not fatal.
    #[error("BZR_ERR_401: Dust amount: {amount} below threshold {threshold}")]
    DustAmount { amount: Amount, threshold: Amount },

    /// The rerun driver exhausted its pass budget — pathological book
    /// state requiring operator attention.
    #[error("BZR_ERR_402: Match pass budget exceeded for order {order} after {passes} passes")]
    RetryBudgetExceeded { order: OrderId, passes: u32 },

    // =================================================================
    // Auction Errors (5xx)
    // =================================================================
    /// The auction item was not found in the store.
    #[error("BZR_ERR_500: Auction item not found: {0}")]
    ItemNotFound(ItemId),

    /// The referenced bid was not found in the store.
    #[error("BZR_ERR_501: Bid not found: {0}")]
    BidNotFound(BidId),

    /// The bid does not clear the current highest plus the floor increment.
    #[error("BZR_ERR_502: Bid too low: offered {offered}, required at least {required}")]
    BidTooLow { offered: Amount, required: Amount },

    /// Bids are no longer accepted on this item.
    #[error("BZR_ERR_503: Auction closed for item {0}")]
    AuctionClosed(ItemId),

    /// Finalization was attempted before the auction's end time.
    #[error("BZR_ERR_504: Auction still open for item {0}")]
    AuctionStillOpen(ItemId),

    // =================================================================
    // Store / Transaction Errors (6xx)
    // =================================================================
    /// A record read by the transaction changed before commit.
    #[error("BZR_ERR_600: Transaction conflict: a read record changed before commit")]
    TxConflict,

    /// The referenced token was not found in the store.
    #[error("BZR_ERR_601: Token not found: {0}")]
    TokenNotFound(TokenId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("BZR_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Integer money arithmetic exceeded the minor-unit range.
    #[error("BZR_ERR_901: Amount overflow")]
    AmountOverflow,

    /// Configuration error (invalid royalty shares, zero page size, etc.).
    #[error("BZR_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, MarketError>;
