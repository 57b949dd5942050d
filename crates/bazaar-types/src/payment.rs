//! Settlement-payment intents.
//!
//! The engine's responsibility ends at durably recording a
//! [`SettlementPayment`] — an *intent* to move value. Submission,
//! confirmation, and retries on the value-transfer network are an external
//! subsystem. Routing metadata is opaque to the engine and carried through
//! untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, ItemId, OrderId, PaymentId, TradeId, constants::LEDGER_NETWORK};

/// What a payment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentRole {
    /// Counterparty proceeds of a trade (gross minus royalty).
    Principal,
    /// A royalty beneficiary's share.
    Royalty,
    /// Return of unconsumed escrow.
    Refund,
}

impl std::fmt::Display for PaymentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Principal => write!(f, "PRINCIPAL"),
            Self::Royalty => write!(f, "ROYALTY"),
            Self::Refund => write!(f, "REFUND"),
        }
    }
}

/// The event that produced a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentSource {
    Trade(TradeId),
    /// Cancellation / expiry compensation for an order.
    Order(OrderId),
    /// Auction refund or finalization for an item.
    Auction(ItemId),
}

/// Routing metadata for the external submission pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRoute {
    /// Which network settles this payment.
    pub network: String,
    /// Set when the amount fell below the dust threshold and the pipeline
    /// should settle it off-network rather than pay gas for it.
    pub below_dust: bool,
    /// Opaque pipeline metadata. The engine never inspects this.
    pub memo: serde_json::Value,
}

impl PaymentRoute {
    /// A payment settled on the marketplace's own ledger.
    #[must_use]
    pub fn ledger() -> Self {
        Self::network(LEDGER_NETWORK)
    }

    /// A payment routed to the named network.
    #[must_use]
    pub fn network(tag: impl Into<String>) -> Self {
        Self {
            network: tag.into(),
            below_dust: false,
            memo: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn flagged_below_dust(mut self) -> Self {
        self.below_dust = true;
        self
    }

    #[must_use]
    pub fn with_memo(mut self, memo: serde_json::Value) -> Self {
        self.memo = memo;
        self
    }
}

/// A recorded intent to move value to a party. Insert-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementPayment {
    pub id: PaymentId,
    pub payer: AccountId,
    pub payee: AccountId,
    pub amount: Amount,
    pub role: PaymentRole,
    pub source: PaymentSource,
    pub route: PaymentRoute,
    pub created_at: DateTime<Utc>,
}

impl SettlementPayment {
    #[must_use]
    pub fn new(
        id: PaymentId,
        payer: AccountId,
        payee: AccountId,
        amount: Amount,
        role: PaymentRole,
        source: PaymentSource,
        route: PaymentRoute,
    ) -> Self {
        Self {
            id,
            payer,
            payee,
            amount,
            role,
            source,
            route,
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for SettlementPayment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Payment[{}] {} {} -> {} ({})",
            self.id, self.role, self.payer, self.payee, self.amount,
        )
    }
}
