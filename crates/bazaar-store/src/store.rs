//! The transactional market store.
//!
//! Strongly-typed in-memory tables with **optimistic, serializable
//! transactions**: a [`Tx`] records the version of every record it reads,
//! stages its writes locally (read-your-writes), and validates all read
//! versions under the write lock at commit. Any record that changed since
//! it was read aborts the commit with [`MarketError::TxConflict`], and
//! [`MarketStore::run_tx`] re-runs the closure from scratch up to a bounded
//! retry budget.
//!
//! This is the conditional read-then-write discipline the engine's
//! correctness leans on: no external locks, every matching page moves the
//! system from one fully-valid state to the next, and a concurrent trigger
//! that loses the race simply re-reads and observes a terminal order.
//!
//! Trades and payments live in **insert-once** tables — they are never
//! versioned because they are never mutated; a duplicate id is rejected at
//! commit, which is what makes the deterministic trade id an idempotency
//! anchor.

use std::collections::HashMap;

use parking_lot::RwLock;

use bazaar_types::{
    AccountId, AuctionItem, Bid, BidId, DistributionRow, ItemId, MarketError, Order, OrderId,
    Result, SettlementPayment, PaymentId, Token, TokenId, Trade, TradeId,
};

/// Key of a versioned record, used for read tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RecordKey {
    Order(OrderId),
    Ledger(AccountId, TokenId),
    Token(TokenId),
    Item(ItemId),
    Bid(BidId),
}

#[derive(Debug, Clone)]
struct Versioned<T> {
    value: T,
    version: u64,
}

#[derive(Default)]
struct Tables {
    orders: HashMap<OrderId, Versioned<Order>>,
    ledger: HashMap<(AccountId, TokenId), Versioned<DistributionRow>>,
    tokens: HashMap<TokenId, Versioned<Token>>,
    items: HashMap<ItemId, Versioned<AuctionItem>>,
    bids: HashMap<BidId, Versioned<Bid>>,
    // Insert-once tables.
    trades: HashMap<TradeId, Trade>,
    payments: HashMap<PaymentId, SettlementPayment>,
    commit_seq: u64,
}

impl Tables {
    fn version_of(&self, key: RecordKey) -> u64 {
        match key {
            RecordKey::Order(id) => self.orders.get(&id).map_or(0, |v| v.version),
            RecordKey::Ledger(account, token) => {
                self.ledger.get(&(account, token)).map_or(0, |v| v.version)
            }
            RecordKey::Token(id) => self.tokens.get(&id).map_or(0, |v| v.version),
            RecordKey::Item(id) => self.items.get(&id).map_or(0, |v| v.version),
            RecordKey::Bid(id) => self.bids.get(&id).map_or(0, |v| v.version),
        }
    }
}

/// The market store. Cheap to share behind an `Arc`.
pub struct MarketStore {
    tables: RwLock<Tables>,
}

impl MarketStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Begin a new transaction.
    #[must_use]
    pub fn begin(&self) -> Tx<'_> {
        Tx {
            store: self,
            reads: HashMap::new(),
            orders: HashMap::new(),
            ledger: HashMap::new(),
            items: HashMap::new(),
            bids: HashMap::new(),
            new_trades: Vec::new(),
            new_payments: Vec::new(),
        }
    }

    /// Run `f` inside a transaction, retrying on commit conflicts up to
    /// `retry_limit` times. Errors returned by `f` itself are surfaced
    /// immediately — only [`MarketError::TxConflict`] at commit retries.
    pub fn run_tx<T, F>(&self, retry_limit: u32, mut f: F) -> Result<T>
    where
        F: FnMut(&mut Tx<'_>) -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            let mut tx = self.begin();
            let out = f(&mut tx)?;
            match tx.commit() {
                Ok(()) => return Ok(out),
                Err(MarketError::TxConflict) if attempt < retry_limit => {
                    attempt += 1;
                    tracing::debug!(attempt, "transaction conflict, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Register a token. Tokens are administered by the collection flow;
    /// the engine only reads them.
    pub fn insert_token(&self, token: Token) {
        let mut tables = self.tables.write();
        tables.commit_seq += 1;
        let version = tables.commit_seq;
        tables
            .tokens
            .insert(token.id, Versioned { value: token, version });
    }

    /// Register an auction item.
    pub fn insert_item(&self, item: AuctionItem) {
        let mut tables = self.tables.write();
        tables.commit_seq += 1;
        let version = tables.commit_seq;
        tables
            .items
            .insert(item.id, Versioned { value: item, version });
    }

    // =================================================================
    // Read-only snapshots (inspection / assertions)
    // =================================================================

    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.tables.read().orders.get(&id).map(|v| v.value.clone())
    }

    #[must_use]
    pub fn trade(&self, id: TradeId) -> Option<Trade> {
        self.tables.read().trades.get(&id).cloned()
    }

    #[must_use]
    pub fn payment(&self, id: PaymentId) -> Option<SettlementPayment> {
        self.tables.read().payments.get(&id).cloned()
    }

    #[must_use]
    pub fn ledger_row(&self, account: AccountId, token: TokenId) -> DistributionRow {
        self.tables
            .read()
            .ledger
            .get(&(account, token))
            .map_or_else(DistributionRow::new, |v| v.value)
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<AuctionItem> {
        self.tables.read().items.get(&id).map(|v| v.value.clone())
    }

    #[must_use]
    pub fn bid(&self, id: BidId) -> Option<Bid> {
        self.tables.read().bids.get(&id).map(|v| v.value.clone())
    }

    /// All recorded trades, unordered.
    #[must_use]
    pub fn trades(&self) -> Vec<Trade> {
        self.tables.read().trades.values().cloned().collect()
    }

    /// All payments with the given payee, ordered by creation time.
    #[must_use]
    pub fn payments_for_payee(&self, payee: AccountId) -> Vec<SettlementPayment> {
        let mut payments: Vec<SettlementPayment> = self
            .tables
            .read()
            .payments
            .values()
            .filter(|p| p.payee == payee)
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.created_at, p.id));
        payments
    }

    /// Every distribution-ledger row, keyed by (account, token). Input to
    /// audit sweeps over the `locked <= owned` invariant.
    #[must_use]
    pub fn ledger_rows(&self) -> Vec<((AccountId, TokenId), DistributionRow)> {
        self.tables
            .read()
            .ledger
            .iter()
            .map(|(key, v)| (*key, v.value))
            .collect()
    }

    /// IDs of ACTIVE orders whose expiry has passed, oldest first.
    /// Input to the periodic expiry sweep.
    #[must_use]
    pub fn expired_active_orders(&self, now: chrono::DateTime<chrono::Utc>) -> Vec<OrderId> {
        let tables = self.tables.read();
        let mut expired: Vec<&Order> = tables
            .orders
            .values()
            .map(|v| &v.value)
            .filter(|o| o.is_active() && o.expires_at <= now)
            .collect();
        expired.sort_by_key(|o| (o.created_at, o.id));
        expired.iter().map(|o| o.id).collect()
    }

    /// IDs of all ACTIVE orders for a token, oldest first. Input to
    /// forced-cancellation sweeps on token state transitions.
    #[must_use]
    pub fn active_orders_for_token(&self, token: TokenId) -> Vec<OrderId> {
        let tables = self.tables.read();
        let mut active: Vec<&Order> = tables
            .orders
            .values()
            .map(|v| &v.value)
            .filter(|o| o.is_active() && o.token == token)
            .collect();
        active.sort_by_key(|o| (o.created_at, o.id));
        active.iter().map(|o| o.id).collect()
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new()
    }
}

/// An optimistic transaction over the store.
pub struct Tx<'a> {
    store: &'a MarketStore,
    /// Version of each record at first read (0 = absent).
    reads: HashMap<RecordKey, u64>,
    // Staged writes, visible to this transaction's own reads.
    orders: HashMap<OrderId, Order>,
    ledger: HashMap<(AccountId, TokenId), DistributionRow>,
    items: HashMap<ItemId, AuctionItem>,
    bids: HashMap<BidId, Bid>,
    new_trades: Vec<Trade>,
    new_payments: Vec<SettlementPayment>,
}

impl Tx<'_> {
    /// Record the committed version of `key` the first time it is touched.
    /// Writes without a prior read become conditional on the version seen
    /// here, which is what makes blind inserts duplicate-safe.
    fn note_read(&mut self, key: RecordKey) {
        if !self.reads.contains_key(&key) {
            let version = self.store.tables.read().version_of(key);
            self.reads.insert(key, version);
        }
    }

    // =================================================================
    // Orders
    // =================================================================

    /// Read an order, staged writes first.
    pub fn get_order(&mut self, id: OrderId) -> Option<Order> {
        self.note_read(RecordKey::Order(id));
        if let Some(staged) = self.orders.get(&id) {
            return Some(staged.clone());
        }
        self.store.tables.read().orders.get(&id).map(|v| v.value.clone())
    }

    /// Stage an order write.
    pub fn put_order(&mut self, order: Order) {
        self.note_read(RecordKey::Order(order.id));
        self.orders.insert(order.id, order);
    }

    /// Insert a new order; fails if the id is already taken.
    ///
    /// # Errors
    /// Returns [`MarketError::DuplicateOrder`] if an order with this id
    /// already exists.
    pub fn create_order(&mut self, order: Order) -> Result<()> {
        if self.get_order(order.id).is_some() {
            return Err(MarketError::DuplicateOrder(order.id));
        }
        self.orders.insert(order.id, order);
        Ok(())
    }

    // =================================================================
    // Ledger rows (upsert-by-increment)
    // =================================================================

    /// Read a ledger row; a missing row reads as all-zero. The intake flow
    /// may not have created the row yet — mutations upsert it.
    pub fn ledger_row(&mut self, account: AccountId, token: TokenId) -> DistributionRow {
        self.note_read(RecordKey::Ledger(account, token));
        if let Some(staged) = self.ledger.get(&(account, token)) {
            return *staged;
        }
        self.store
            .tables
            .read()
            .ledger
            .get(&(account, token))
            .map_or_else(DistributionRow::new, |v| v.value)
    }

    /// Stage a ledger-row write.
    pub fn put_ledger_row(&mut self, account: AccountId, token: TokenId, row: DistributionRow) {
        self.note_read(RecordKey::Ledger(account, token));
        self.ledger.insert((account, token), row);
    }

    // =================================================================
    // Tokens (read-only inside transactions)
    // =================================================================

    /// Read a token's metadata.
    ///
    /// # Errors
    /// Returns [`MarketError::TokenNotFound`] if the token is unknown.
    pub fn get_token(&mut self, id: TokenId) -> Result<Token> {
        self.note_read(RecordKey::Token(id));
        self.store
            .tables
            .read()
            .tokens
            .get(&id)
            .map(|v| v.value.clone())
            .ok_or(MarketError::TokenNotFound(id))
    }

    // =================================================================
    // Auction items and bids
    // =================================================================

    /// Read an auction item.
    ///
    /// # Errors
    /// Returns [`MarketError::ItemNotFound`] if the item is unknown.
    pub fn get_item(&mut self, id: ItemId) -> Result<AuctionItem> {
        self.note_read(RecordKey::Item(id));
        if let Some(staged) = self.items.get(&id) {
            return Ok(staged.clone());
        }
        self.store
            .tables
            .read()
            .items
            .get(&id)
            .map(|v| v.value.clone())
            .ok_or(MarketError::ItemNotFound(id))
    }

    pub fn put_item(&mut self, item: AuctionItem) {
        self.note_read(RecordKey::Item(item.id));
        self.items.insert(item.id, item);
    }

    /// Read a bid.
    ///
    /// # Errors
    /// Returns [`MarketError::BidNotFound`] if the bid is unknown.
    pub fn get_bid(&mut self, id: BidId) -> Result<Bid> {
        self.note_read(RecordKey::Bid(id));
        if let Some(staged) = self.bids.get(&id) {
            return Ok(staged.clone());
        }
        self.store
            .tables
            .read()
            .bids
            .get(&id)
            .map(|v| v.value.clone())
            .ok_or(MarketError::BidNotFound(id))
    }

    pub fn put_bid(&mut self, bid: Bid) {
        self.note_read(RecordKey::Bid(bid.id));
        self.bids.insert(bid.id, bid);
    }

    // =================================================================
    // Insert-once records
    // =================================================================

    /// Record an immutable trade.
    ///
    /// # Errors
    /// Returns [`MarketError::DuplicateTrade`] if this trade id was already
    /// recorded — the idempotency anchor against double-settlement.
    pub fn record_trade(&mut self, trade: Trade) -> Result<()> {
        if self.new_trades.iter().any(|t| t.id == trade.id)
            || self.store.tables.read().trades.contains_key(&trade.id)
        {
            return Err(MarketError::DuplicateTrade(trade.id));
        }
        self.new_trades.push(trade);
        Ok(())
    }

    /// Record a settlement-payment intent.
    ///
    /// # Errors
    /// Returns [`MarketError::DuplicatePayment`] if this payment id was
    /// already recorded.
    pub fn record_payment(&mut self, payment: SettlementPayment) -> Result<()> {
        if self.new_payments.iter().any(|p| p.id == payment.id)
            || self.store.tables.read().payments.contains_key(&payment.id)
        {
            return Err(MarketError::DuplicatePayment(payment.id));
        }
        self.new_payments.push(payment);
        Ok(())
    }

    // =================================================================
    // Internal access for the crossing query
    // =================================================================

    pub(crate) fn scan_orders<T>(
        &mut self,
        mut visit: impl FnMut(&Order) -> Option<T>,
    ) -> Vec<(T, OrderId)> {
        // Overlay staged writes on the committed table so the scan is
        // read-your-writes consistent.
        let mut out = Vec::new();
        {
            let tables = self.store.tables.read();
            for (id, versioned) in &tables.orders {
                if self.orders.contains_key(id) {
                    continue;
                }
                if let Some(item) = visit(&versioned.value) {
                    out.push((item, *id));
                }
            }
        }
        for (id, staged) in &self.orders {
            if let Some(item) = visit(staged) {
                out.push((item, *id));
            }
        }
        out
    }

    pub(crate) fn note_order_read(&mut self, id: OrderId) {
        self.note_read(RecordKey::Order(id));
    }

    // =================================================================
    // Commit
    // =================================================================

    /// Validate every read version and apply the staged writes atomically.
    ///
    /// # Errors
    /// Returns [`MarketError::TxConflict`] if any record read by this
    /// transaction changed since it was read, or a duplicate-id error for
    /// insert-once collisions.
    pub fn commit(self) -> Result<()> {
        let mut tables = self.store.tables.write();

        for (key, seen) in &self.reads {
            if tables.version_of(*key) != *seen {
                return Err(MarketError::TxConflict);
            }
        }
        for trade in &self.new_trades {
            if tables.trades.contains_key(&trade.id) {
                return Err(MarketError::DuplicateTrade(trade.id));
            }
        }
        for payment in &self.new_payments {
            if tables.payments.contains_key(&payment.id) {
                return Err(MarketError::DuplicatePayment(payment.id));
            }
        }

        tables.commit_seq += 1;
        let version = tables.commit_seq;

        for (id, order) in self.orders {
            tables.orders.insert(id, Versioned { value: order, version });
        }
        for (key, row) in self.ledger {
            tables.ledger.insert(key, Versioned { value: row, version });
        }
        for (id, item) in self.items {
            tables.items.insert(id, Versioned { value: item, version });
        }
        for (id, bid) in self.bids {
            tables.bids.insert(id, Versioned { value: bid, version });
        }
        for trade in self.new_trades {
            tables.trades.insert(trade.id, trade);
        }
        for payment in self.new_payments {
            tables.payments.insert(payment.id, payment);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bazaar_types::{Amount, OrderSide, TokenPhase};
    use chrono::Utc;

    use super::*;

    fn store_with_token() -> (MarketStore, Token) {
        let store = MarketStore::new();
        let token = Token::new("GLD", TokenPhase::LedgerBacked, "ledger");
        store.insert_token(token.clone());
        (store, token)
    }

    #[test]
    fn create_and_read_order() {
        let (store, token) = store_with_token();
        let order = Order::dummy_for(
            AccountId::new(),
            token.id,
            OrderSide::Buy,
            Amount::from_minor(100),
            5,
        );
        let id = order.id;

        store
            .run_tx(0, |tx| {
                tx.create_order(order.clone())?;
                Ok(())
            })
            .unwrap();

        let read = store.order(id).unwrap();
        assert_eq!(read.quantity, 5);
        assert!(read.is_active());
    }

    #[test]
    fn duplicate_order_rejected() {
        let (store, token) = store_with_token();
        let order = Order::dummy_for(
            AccountId::new(),
            token.id,
            OrderSide::Sell,
            Amount::from_minor(100),
            5,
        );
        store
            .run_tx(0, |tx| tx.create_order(order.clone()))
            .unwrap();

        let err = store
            .run_tx(0, |tx| tx.create_order(order.clone()))
            .unwrap_err();
        assert!(matches!(err, MarketError::DuplicateOrder(_)));
    }

    #[test]
    fn conflicting_commit_aborts() {
        let (store, token) = store_with_token();
        let mut order = Order::dummy_for(
            AccountId::new(),
            token.id,
            OrderSide::Sell,
            Amount::from_minor(100),
            10,
        );
        let id = order.id;
        store.run_tx(0, |tx| tx.create_order(order.clone())).unwrap();

        // Two overlapping transactions read the same order.
        let mut tx1 = store.begin();
        let mut tx2 = store.begin();
        let mut o1 = tx1.get_order(id).unwrap();
        let o2 = tx2.get_order(id).unwrap();

        o1.record_fill(3).unwrap();
        tx1.put_order(o1);
        tx1.commit().unwrap();

        // tx2's read is now stale; its write must not clobber tx1's.
        order = o2;
        tx2.put_order(order);
        let err = tx2.commit().unwrap_err();
        assert!(matches!(err, MarketError::TxConflict));

        assert_eq!(store.order(id).unwrap().filled, 3);
    }

    #[test]
    fn run_tx_retries_conflicts() {
        let (store, token) = store_with_token();
        let order = Order::dummy_for(
            AccountId::new(),
            token.id,
            OrderSide::Sell,
            Amount::from_minor(100),
            10,
        );
        let id = order.id;
        store.run_tx(0, |tx| tx.create_order(order.clone())).unwrap();

        // Force one conflict: the closure's first run races a direct
        // commit made between its read and its commit.
        let mut interfered = false;
        store
            .run_tx(2, |tx| {
                let mut o = tx.get_order(id).unwrap();
                if !interfered {
                    interfered = true;
                    let mut racer = store.begin();
                    let mut r = racer.get_order(id).unwrap();
                    r.record_fill(1).unwrap();
                    racer.put_order(r);
                    racer.commit().unwrap();
                }
                o.record_fill(2).unwrap();
                tx.put_order(o);
                Ok(())
            })
            .unwrap();

        // Both the racer's fill and the retried closure's fill landed.
        assert_eq!(store.order(id).unwrap().filled, 3);
    }

    #[test]
    fn ledger_upserts_by_increment() {
        let (store, token) = store_with_token();
        let account = AccountId::new();

        store
            .run_tx(0, |tx| {
                // No row exists yet — reads as zero, mutation creates it.
                let mut row = tx.ledger_row(account, token.id);
                assert!(row.is_zero());
                row.deposit(25);
                tx.put_ledger_row(account, token.id, row);
                Ok(())
            })
            .unwrap();

        assert_eq!(store.ledger_row(account, token.id).owned, 25);
        assert_eq!(store.ledger_row(account, token.id).deposited, 25);
    }

    #[test]
    fn record_trade_is_insert_once() {
        let (store, token) = store_with_token();
        let buy = Order::dummy_for(
            AccountId::new(),
            token.id,
            OrderSide::Buy,
            Amount::from_minor(100),
            1,
        );
        let sell = Order::dummy_for(
            AccountId::new(),
            token.id,
            OrderSide::Sell,
            Amount::from_minor(100),
            1,
        );
        let trade = Trade {
            id: TradeId::deterministic(buy.id, sell.id, 0),
            buy_order: buy.id,
            sell_order: sell.id,
            buyer: buy.owner,
            seller: sell.owner,
            token: token.id,
            quantity: 1,
            price: Amount::from_minor(100),
            notional: Amount::from_minor(100),
            executed_at: Utc::now(),
            payments: vec![],
        };

        store.run_tx(0, |tx| tx.record_trade(trade.clone())).unwrap();
        let err = store
            .run_tx(0, |tx| tx.record_trade(trade.clone()))
            .unwrap_err();
        assert!(matches!(err, MarketError::DuplicateTrade(_)));
        assert_eq!(store.trades().len(), 1);
    }

    #[test]
    fn missing_token_errors() {
        let store = MarketStore::new();
        let err = store
            .run_tx(0, |tx| tx.get_token(TokenId::new()).map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, MarketError::TokenNotFound(_)));
    }

    #[test]
    fn expired_sweep_finds_only_past_active() {
        let (store, token) = store_with_token();
        let now = Utc::now();

        let mut expired = Order::dummy_for(
            AccountId::new(),
            token.id,
            OrderSide::Sell,
            Amount::from_minor(100),
            1,
        );
        expired.expires_at = now - chrono::Duration::minutes(1);
        let expired_id = expired.id;

        let live = Order::dummy_for(
            AccountId::new(),
            token.id,
            OrderSide::Sell,
            Amount::from_minor(100),
            1,
        );

        store
            .run_tx(0, |tx| {
                tx.create_order(expired.clone())?;
                tx.create_order(live.clone())
            })
            .unwrap();

        let swept = store.expired_active_orders(now);
        assert_eq!(swept, vec![expired_id]);
    }
}
