//! The crossing-order query: price-time priority with page cursors.
//!
//! A matching pass asks for the counter-side ACTIVE orders of a token
//! whose limit crosses the triggering order's, best price first and
//! earliest creation first within a price, bounded to a page that fits one
//! transaction. The [`PageCursor`] resumes a drain strictly after the last
//! candidate of the previous page, so books larger than a page are drained
//! across sequential transactions.
//!
//! Orders inserted concurrently with a drain may be missed by an in-flight
//! cursor; that is tolerated because every new order triggers its own
//! drain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_types::{Amount, Order, OrderId, OrderSide};

use crate::store::Tx;

/// Resumption point within a price-time-ordered candidate scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    pub price: Amount,
    pub created_at: DateTime<Utc>,
    pub id: OrderId,
}

impl PageCursor {
    #[must_use]
    pub fn after(order: &Order) -> Self {
        Self {
            price: order.price,
            created_at: order.created_at,
            id: order.id,
        }
    }
}

/// Composite sort key: price priority first (best price for the taker
/// sorts lowest), then creation time, then id as the final tiebreak.
type Rank = (u64, DateTime<Utc>, OrderId);

fn rank(taker_side: OrderSide, price: Amount, created_at: DateTime<Utc>, id: OrderId) -> Rank {
    let price_key = match taker_side {
        // Buy taker scans sells: cheapest first.
        OrderSide::Buy => price.minor(),
        // Sell taker scans buys: highest first.
        OrderSide::Sell => u64::MAX - price.minor(),
    };
    (price_key, created_at, id)
}

impl Tx<'_> {
    /// One page of counter-side candidates for `taker`, price-time ordered,
    /// resuming strictly after `cursor`. Records a read on every returned
    /// order so a concurrent mutation of a candidate aborts the commit.
    pub fn crossing_page(
        &mut self,
        taker: &Order,
        page_size: usize,
        cursor: Option<&PageCursor>,
    ) -> Vec<Order> {
        let counter_side = taker.side.opposite();
        let token = taker.token;
        let taker_snapshot = taker.clone();

        let mut candidates: Vec<(Rank, Order)> = self
            .scan_orders(|order| {
                if order.side == counter_side
                    && order.token == token
                    && order.is_active()
                    && taker_snapshot.crosses(order)
                {
                    Some((
                        rank(taker_snapshot.side, order.price, order.created_at, order.id),
                        order.clone(),
                    ))
                } else {
                    None
                }
            })
            .into_iter()
            .map(|(item, _)| item)
            .collect();

        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        let cursor_rank =
            cursor.map(|c| rank(taker_snapshot.side, c.price, c.created_at, c.id));
        let page: Vec<Order> = candidates
            .into_iter()
            .filter(|(r, _)| cursor_rank.is_none_or(|c| *r > c))
            .take(page_size)
            .map(|(_, order)| order)
            .collect();

        for order in &page {
            self.note_order_read(order.id);
        }
        page
    }
}
