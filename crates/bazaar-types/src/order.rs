//! Order types for the TokenBazaar matching engine.
//!
//! An order only reaches the engine after the intake flow has confirmed
//! its deposit: a sell order's tokens are locked in the distribution
//! ledger, a buy order's settlement currency is escrowed in
//! `remaining_balance`. Status transitions are one-directional — a
//! terminal order never becomes ACTIVE again, which is what makes
//! duplicate triggers safe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, MarketError, OrderId, Result, TokenId};

/// Which side of the book this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The side a counter-order must be on to match this one.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Reason tag carried by an administratively forced cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForcedReason {
    /// The token moved to a lifecycle phase that invalidates open orders.
    TokenPhaseTransition,
    /// The token was withdrawn from the marketplace.
    TokenWithdrawn,
    /// Operator-initiated cancellation.
    Administrative,
}

impl std::fmt::Display for ForcedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenPhaseTransition => write!(f, "TOKEN_PHASE_TRANSITION"),
            Self::TokenWithdrawn => write!(f, "TOKEN_WITHDRAWN"),
            Self::Administrative => write!(f, "ADMINISTRATIVE"),
        }
    }
}

/// Lifecycle status of an order. Transitions are one-directional;
/// every status except `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Active,
    Settled,
    Cancelled,
    PartiallySettledAndCancelled,
    Expired,
    CancelledForced(ForcedReason),
}

impl OrderStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::PartiallySettledAndCancelled => {
                write!(f, "PARTIALLY_SETTLED_AND_CANCELLED")
            }
            Self::Expired => write!(f, "EXPIRED"),
            Self::CancelledForced(reason) => write!(f, "CANCELLED_FORCED({reason})"),
        }
    }
}

/// A trade intent against a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: AccountId,
    pub token: TokenId,
    pub side: OrderSide,
    /// Requested quantity in token units.
    pub quantity: u64,
    /// Limit price per unit, settlement-currency minor units.
    pub price: Amount,
    /// Cumulative filled quantity. Monotonic, never exceeds `quantity`.
    pub filled: u64,
    /// Settlement-currency escrow still held against this order.
    /// Zero for sell orders — their escrow is the ledger lock.
    pub remaining_balance: Amount,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Reference to the inbound payment that funded this order.
    pub funding_ref: Option<String>,
    /// Reference to the outgoing-credit route for this order's proceeds.
    pub payout_ref: Option<String>,
}

impl Order {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Active
    }

    /// Unfilled remainder in token units.
    #[must_use]
    pub fn remaining_qty(&self) -> u64 {
        self.quantity.saturating_sub(self.filled)
    }

    /// Whether this order's limit crosses a counter-order's limit
    /// (buy.price >= sell.price).
    #[must_use]
    pub fn crosses(&self, other: &Order) -> bool {
        match (self.side, other.side) {
            (OrderSide::Buy, OrderSide::Sell) => self.price >= other.price,
            (OrderSide::Sell, OrderSide::Buy) => other.price >= self.price,
            _ => false,
        }
    }

    /// Record a fill of `qty` units. Sets `Settled` when the requested
    /// quantity is reached.
    ///
    /// # Errors
    /// Returns [`MarketError::Overfill`] if the fill would exceed the
    /// requested quantity.
    pub fn record_fill(&mut self, qty: u64) -> Result<()> {
        let new_filled = self
            .filled
            .checked_add(qty)
            .filter(|f| *f <= self.quantity)
            .ok_or(MarketError::Overfill {
                order: self.id,
                filled: self.filled,
                delta: qty,
                requested: self.quantity,
            })?;
        self.filled = new_filled;
        if self.filled == self.quantity {
            self.status = OrderStatus::Settled;
        }
        Ok(())
    }

    /// Consume `notional` from the escrowed balance (buy fills).
    ///
    /// # Errors
    /// Returns [`MarketError::InsufficientEscrow`] if the escrow cannot
    /// cover the notional.
    pub fn consume_balance(&mut self, notional: Amount) -> Result<()> {
        if self.remaining_balance < notional {
            return Err(MarketError::InsufficientEscrow {
                need: notional,
                escrowed: self.remaining_balance,
            });
        }
        self.remaining_balance = self.remaining_balance.checked_sub(notional)?;
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// An ACTIVE limit order with sensible defaults. Buy orders are
    /// escrowed for their full notional.
    pub fn dummy(side: OrderSide, price: Amount, qty: u64) -> Self {
        Self::dummy_for(AccountId::new(), TokenId::new(), side, price, qty)
    }

    pub fn dummy_for(
        owner: AccountId,
        token: TokenId,
        side: OrderSide,
        price: Amount,
        qty: u64,
    ) -> Self {
        let now = Utc::now();
        let escrow = match side {
            OrderSide::Buy => price.notional(qty).expect("test notional fits u64"),
            OrderSide::Sell => Amount::ZERO,
        };
        Self {
            id: OrderId::new(),
            owner,
            token,
            side,
            quantity: qty,
            price,
            filled: 0,
            remaining_balance: escrow,
            status: OrderStatus::Active,
            created_at: now,
            expires_at: now + chrono::Duration::days(7),
            funding_ref: Some(format!("funding:{}", uuid::Uuid::now_v7())),
            payout_ref: Some(format!("payout:{}", uuid::Uuid::now_v7())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_display_and_opposite() {
        assert_eq!(format!("{}", OrderSide::Buy), "BUY");
        assert_eq!(format!("{}", OrderSide::Sell), "SELL");
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn status_terminality() {
        assert!(!OrderStatus::Active.is_terminal());
        assert!(OrderStatus::Settled.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(OrderStatus::CancelledForced(ForcedReason::Administrative).is_terminal());
    }

    #[test]
    fn forced_status_display_carries_reason() {
        let status = OrderStatus::CancelledForced(ForcedReason::TokenPhaseTransition);
        assert_eq!(
            format!("{status}"),
            "CANCELLED_FORCED(TOKEN_PHASE_TRANSITION)"
        );
    }

    #[test]
    fn crossing_rule() {
        let buy = Order::dummy(OrderSide::Buy, Amount::from_minor(100), 1);
        let sell_below = Order::dummy(OrderSide::Sell, Amount::from_minor(90), 1);
        let sell_above = Order::dummy(OrderSide::Sell, Amount::from_minor(110), 1);
        assert!(buy.crosses(&sell_below));
        assert!(sell_below.crosses(&buy));
        assert!(!buy.crosses(&sell_above));
        // same side never crosses
        let buy2 = Order::dummy(OrderSide::Buy, Amount::from_minor(100), 1);
        assert!(!buy.crosses(&buy2));
    }

    #[test]
    fn fill_is_monotonic_and_settles() {
        let mut order = Order::dummy(OrderSide::Sell, Amount::from_minor(100), 10);
        order.record_fill(4).unwrap();
        assert_eq!(order.filled, 4);
        assert_eq!(order.remaining_qty(), 6);
        assert!(order.is_active());

        order.record_fill(6).unwrap();
        assert_eq!(order.status, OrderStatus::Settled);
        assert_eq!(order.remaining_qty(), 0);
    }

    #[test]
    fn overfill_rejected() {
        let mut order = Order::dummy(OrderSide::Sell, Amount::from_minor(100), 10);
        order.record_fill(8).unwrap();
        let err = order.record_fill(3).unwrap_err();
        assert!(matches!(err, MarketError::Overfill { filled: 8, .. }));
        // state unchanged after the failed fill
        assert_eq!(order.filled, 8);
        assert!(order.is_active());
    }

    #[test]
    fn buy_escrow_consumption() {
        let mut order = Order::dummy(OrderSide::Buy, Amount::from_minor(100), 10);
        assert_eq!(order.remaining_balance, Amount::from_minor(1_000));

        order.consume_balance(Amount::from_minor(400)).unwrap();
        assert_eq!(order.remaining_balance, Amount::from_minor(600));

        let err = order.consume_balance(Amount::from_minor(601)).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientEscrow { .. }));
    }

    #[test]
    fn order_serde_roundtrip() {
        let order = Order::dummy(OrderSide::Buy, Amount::from_minor(250), 4);
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order.id, back.id);
        assert_eq!(order.price, back.price);
        assert_eq!(order.status, back.status);
    }
}
