//! Trade types produced by the match engine.
//!
//! A [`Trade`] is the immutable record of a fill between a buy and a sell
//! order at the resting order's price. It is created exactly once, inside
//! the same transaction that mutates the two orders, and doubles as the
//! idempotency anchor: its deterministic id makes a re-derived fill collide
//! with the already-recorded one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, OrderId, PaymentId, TokenId, TradeId};

/// An immutable match record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub buy_order: OrderId,
    pub sell_order: OrderId,
    pub buyer: AccountId,
    pub seller: AccountId,
    pub token: TokenId,
    /// Executed quantity in token units.
    pub quantity: u64,
    /// Execution price per unit — the resting (maker) order's price.
    pub price: Amount,
    /// `quantity × price` in minor units.
    pub notional: Amount,
    pub executed_at: DateTime<Utc>,
    /// The settlement payments this trade produced, in emission order.
    pub payments: Vec<PaymentId>,
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade[{}] {} x {} @ {} = {}",
            self.id, self.token, self.quantity, self.price, self.notional,
        )
    }
}
