//! Distribution-ledger operations over a transaction.
//!
//! Thin wrappers that read a row (all-zero when missing), apply one
//! guarded mutation from [`DistributionRow`], and stage the result —
//! upsert-by-increment, never overwrite. The intake flow and the engine
//! share these; nothing else writes ledger rows.

use bazaar_types::{AccountId, Result, TokenId};

use crate::store::Tx;

impl Tx<'_> {
    /// Intake deposit of `qty` token units.
    pub fn ledger_deposit(&mut self, account: AccountId, token: TokenId, qty: u64) {
        let mut row = self.ledger_row(account, token);
        row.deposit(qty);
        self.put_ledger_row(account, token, row);
    }

    /// Reserve `qty` units against a new sell order.
    pub fn ledger_lock_for_sale(
        &mut self,
        account: AccountId,
        token: TokenId,
        qty: u64,
    ) -> Result<()> {
        let mut row = self.ledger_row(account, token);
        row.lock_for_sale(qty)?;
        self.put_ledger_row(account, token, row);
        Ok(())
    }

    /// Release an unfilled sell reservation (cancellation compensation).
    pub fn ledger_release_lock(
        &mut self,
        account: AccountId,
        token: TokenId,
        qty: u64,
    ) -> Result<()> {
        let mut row = self.ledger_row(account, token);
        row.release_lock(qty)?;
        self.put_ledger_row(account, token, row);
        Ok(())
    }

    /// Seller-side settlement of a fill.
    pub fn ledger_apply_sale(
        &mut self,
        account: AccountId,
        token: TokenId,
        qty: u64,
    ) -> Result<()> {
        let mut row = self.ledger_row(account, token);
        row.apply_sale(qty)?;
        self.put_ledger_row(account, token, row);
        Ok(())
    }

    /// Buyer-side settlement of a fill.
    pub fn ledger_apply_purchase(&mut self, account: AccountId, token: TokenId, qty: u64) {
        let mut row = self.ledger_row(account, token);
        row.apply_purchase(qty);
        self.put_ledger_row(account, token, row);
    }

    /// Counter-only purchase record for chain-issued delivery.
    pub fn ledger_record_purchase(&mut self, account: AccountId, token: TokenId, qty: u64) {
        let mut row = self.ledger_row(account, token);
        row.record_purchase(qty);
        self.put_ledger_row(account, token, row);
    }
}

#[cfg(test)]
mod tests {
    use bazaar_types::{MarketError, Token, TokenPhase};

    use crate::store::MarketStore;

    use super::*;

    fn setup() -> (MarketStore, TokenId, AccountId) {
        let store = MarketStore::new();
        let token = Token::new("GLD", TokenPhase::LedgerBacked, "ledger");
        let id = token.id;
        store.insert_token(token);
        (store, id, AccountId::new())
    }

    #[test]
    fn deposit_then_lock_then_sale() {
        let (store, token, seller) = setup();
        store
            .run_tx(0, |tx| {
                tx.ledger_deposit(seller, token, 10);
                tx.ledger_lock_for_sale(seller, token, 10)?;
                tx.ledger_apply_sale(seller, token, 4)
            })
            .unwrap();

        let row = store.ledger_row(seller, token);
        assert_eq!(row.owned, 6);
        assert_eq!(row.locked_for_sale, 6);
        assert_eq!(row.sold, 4);
        row.check_invariant().unwrap();
    }

    #[test]
    fn lock_without_deposit_fails_and_stages_nothing() {
        let (store, token, seller) = setup();
        let err = store
            .run_tx(0, |tx| tx.ledger_lock_for_sale(seller, token, 1))
            .unwrap_err();
        assert!(matches!(err, MarketError::LockExceedsOwned { .. }));
        assert!(store.ledger_row(seller, token).is_zero());
    }

    #[test]
    fn purchase_upserts_missing_row() {
        let (store, token, buyer) = setup();
        store
            .run_tx(0, |tx| {
                tx.ledger_apply_purchase(buyer, token, 5);
                Ok(())
            })
            .unwrap();
        let row = store.ledger_row(buyer, token);
        assert_eq!(row.owned, 5);
        assert_eq!(row.purchased, 5);
        assert_eq!(row.deposited, 0);
    }

    #[test]
    fn chain_issued_purchase_is_counter_only() {
        let (store, token, buyer) = setup();
        store
            .run_tx(0, |tx| {
                tx.ledger_record_purchase(buyer, token, 5);
                Ok(())
            })
            .unwrap();
        let row = store.ledger_row(buyer, token);
        assert_eq!(row.owned, 0);
        assert_eq!(row.purchased, 5);
    }
}
