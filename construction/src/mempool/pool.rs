//! Gas-price-ordered pool of submitted transactions.
//!
//! Transactions are indexed by hash for O(1) duplicate detection, and sorted
//! by gas price in a B-tree so the broadcaster can pick the best-paying ones
//! first. Per-sender tracking stops one account from filling the pool.
//!
//! ## Design
//!
//! - `DashMap` holds the entries. Duplicate detection and idempotent accept
//!   go through its entry API, so two concurrent submits of the same hash
//!   insert once.
//! - `parking_lot::RwLock<BTreeMap>` protects the price index. Readers
//!   (selection) far outnumber writers (accept, eviction).
//! - A sender slot is taken through the `DashMap` entry API before the
//!   transaction is inserted, and handed back if the insert loses a race or
//!   finds no room.
//! - When the pool is full, the lowest-priced entry is evicted if the
//!   incoming transaction offers a strictly higher gas price. A duplicate
//!   never evicts anything.
//! - Entries added with [`Mempool::add_pending`] are reserved: held and
//!   counted, but skipped by selection until confirmed.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::address::Address;
use crate::mempool::{Acceptance, MempoolError, SubmissionSink};
use crate::transaction::{NativeTransaction, TransactionCodec};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable parameters for pool behaviour.
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    /// Maximum number of transactions the pool will hold.
    pub max_size: usize,

    /// Maximum pending transactions allowed per sender address.
    pub max_per_sender: usize,

    /// Seconds after which a transaction is stale and removed by
    /// [`Mempool::expire_old`].
    pub expiry_seconds: u64,

    /// Minimum acceptable gas price in Qa. Zero disables the check.
    pub min_gas_price: u128,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            max_per_sender: 100,
            expiry_seconds: 3600,
            min_gas_price: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// PriceKey
// ---------------------------------------------------------------------------

/// Ordering key for the price index: highest gas price first, then oldest,
/// then hash for a total order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PriceKey {
    /// `u128::MAX - gas_price`, so ascending iteration is highest-price-first.
    inverted_price: u128,
    added_at: i64,
    hash: String,
}

impl PriceKey {
    fn for_entry(entry: &MempoolEntry) -> Self {
        Self {
            inverted_price: u128::MAX - entry.transaction.gas_price,
            added_at: entry.added_at,
            hash: entry.hash.clone(),
        }
    }

    fn gas_price(&self) -> u128 {
        u128::MAX - self.inverted_price
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inverted_price
            .cmp(&other.inverted_price)
            .then_with(|| self.added_at.cmp(&other.added_at))
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// MempoolEntry
// ---------------------------------------------------------------------------

/// A transaction together with pool bookkeeping.
#[derive(Debug, Clone)]
pub struct MempoolEntry {
    pub transaction: NativeTransaction,
    pub hash: String,
    pub sender: Address,
    /// Unix timestamp (seconds) of acceptance.
    pub added_at: i64,
    /// Reserved while a broadcast is in flight.
    pub pending: bool,
}

// ---------------------------------------------------------------------------
// Mempool
// ---------------------------------------------------------------------------

/// A thread-safe pool of signed transactions awaiting inclusion.
pub struct Mempool {
    codec: TransactionCodec,
    transactions: DashMap<String, MempoolEntry>,
    price_index: RwLock<BTreeMap<PriceKey, String>>,
    sender_counts: DashMap<Address, usize>,
    config: MempoolConfig,
}

impl fmt::Debug for Mempool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mempool")
            .field("chain_id", &self.codec.chain_id())
            .field("size", &self.transactions.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Mempool {
    /// Creates a pool that verifies hashes with `codec`.
    pub fn new(codec: TransactionCodec, config: MempoolConfig) -> Self {
        Self {
            codec,
            transactions: DashMap::new(),
            price_index: RwLock::new(BTreeMap::new()),
            sender_counts: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &MempoolConfig {
        &self.config
    }

    /// Adds a signed transaction.
    ///
    /// Checks, in order: the `id` is present and equals the content hash;
    /// the transaction is signed; a held hash short-circuits to
    /// `AlreadyKnown` (or `BroadcastInFlight` while it is reserved); the
    /// gas price meets the minimum; the sender is under its limit; there is
    /// room, possibly after evicting the cheapest entry.
    pub fn add(&self, tx: &NativeTransaction) -> Result<Acceptance, MempoolError> {
        self.insert(tx, false)
    }

    /// Like [`add`](Self::add), but the entry stays reserved: it is held and
    /// counted, yet not selectable until [`confirm`](Self::confirm).
    pub fn add_pending(&self, tx: &NativeTransaction) -> Result<Acceptance, MempoolError> {
        self.insert(tx, true)
    }

    /// Marks a reserved entry as accepted.
    pub fn confirm(&self, hash: &str) -> bool {
        match self.transactions.get_mut(hash) {
            Some(mut entry) => {
                entry.pending = false;
                true
            }
            None => false,
        }
    }

    fn insert(&self, tx: &NativeTransaction, pending: bool) -> Result<Acceptance, MempoolError> {
        let declared = tx.id.as_deref().ok_or(MempoolError::MissingHash)?;
        let computed = self
            .codec
            .hash(tx)
            .map_err(|e| MempoolError::Encoding(e.to_string()))?;
        if !declared.eq_ignore_ascii_case(&computed) {
            return Err(MempoolError::HashMismatch {
                declared: declared.to_string(),
                computed,
            });
        }
        if !tx.is_signed() {
            return Err(MempoolError::Unsigned);
        }

        if let Some(held) = self.transactions.get(&computed) {
            let reserved = held.pending;
            drop(held);
            return Self::already_held(computed, reserved);
        }

        if tx.gas_price < self.config.min_gas_price {
            return Err(MempoolError::GasPriceTooLow {
                min: self.config.min_gas_price,
                got: tx.gas_price,
            });
        }

        let sender = tx.sender();
        self.take_sender_slot(&sender)?;

        let entry = MempoolEntry {
            transaction: tx.clone(),
            hash: computed.clone(),
            sender,
            added_at: Utc::now().timestamp(),
            pending,
        };
        let key = PriceKey::for_entry(&entry);

        match self.transactions.entry(computed.clone()) {
            // Lost a race with a concurrent submit of the same hash.
            Entry::Occupied(held) => {
                let reserved = held.get().pending;
                drop(held);
                self.decrement_sender_count(&sender);
                return Self::already_held(computed, reserved);
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }

        // The new entry is not in the price index yet, so eviction cannot
        // pick it.
        if self.transactions.len() > self.config.max_size && !self.try_evict_lowest(tx.gas_price) {
            self.transactions.remove(&computed);
            self.decrement_sender_count(&sender);
            return Err(MempoolError::MempoolFull {
                size: self.config.max_size,
            });
        }
        self.price_index.write().insert(key, computed.clone());

        info!(hash = %computed, sender = %sender, gas_price = %tx.gas_price, pending, "transaction accepted into mempool");
        Ok(Acceptance::Accepted)
    }

    /// Removes a transaction by hash and returns it.
    pub fn remove(&self, hash: &str) -> Option<NativeTransaction> {
        let (_, entry) = self.transactions.remove(hash)?;
        self.remove_from_indices(&entry);
        Some(entry.transaction)
    }

    /// Batch-removes transactions, typically once the node confirms them.
    /// Missing hashes are ignored.
    pub fn remove_batch(&self, hashes: &[String]) {
        for hash in hashes {
            self.remove(hash);
        }
    }

    pub fn get(&self, hash: &str) -> Option<NativeTransaction> {
        self.transactions.get(hash).map(|e| e.transaction.clone())
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.transactions.contains_key(hash)
    }

    /// Up to `max_count` accepted transactions, highest gas price first.
    /// Reserved entries are skipped.
    pub fn select_transactions(&self, max_count: usize) -> Vec<NativeTransaction> {
        let index = self.price_index.read();
        let mut result = Vec::with_capacity(max_count.min(index.len()));

        for hash in index.values() {
            if result.len() >= max_count {
                break;
            }
            if let Some(entry) = self.transactions.get(hash) {
                if !entry.pending {
                    result.push(entry.transaction.clone());
                }
            }
        }

        result
    }

    pub fn size(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn clear(&self) {
        self.transactions.clear();
        self.price_index.write().clear();
        self.sender_counts.clear();
    }

    /// Removes transactions older than `config.expiry_seconds`. Returns how
    /// many were removed.
    pub fn expire_old(&self) -> usize {
        let cutoff = Utc::now().timestamp() - self.config.expiry_seconds as i64;
        self.expire_added_before(cutoff)
    }

    fn expire_added_before(&self, cutoff: i64) -> usize {
        // Collect first; removing while iterating a DashMap deadlocks.
        let expired: Vec<String> = self
            .transactions
            .iter()
            .filter(|entry| entry.value().added_at < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        for hash in &expired {
            self.remove(hash);
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "expired stale mempool entries");
        }
        expired.len()
    }

    pub fn pending_for_sender(&self, sender: &Address) -> Vec<NativeTransaction> {
        self.transactions
            .iter()
            .filter(|entry| entry.value().sender == *sender)
            .map(|entry| entry.value().transaction.clone())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Evicts the cheapest entry if `incoming_price` outbids it.
    fn try_evict_lowest(&self, incoming_price: u128) -> bool {
        let mut index = self.price_index.write();

        let lowest = match index.keys().next_back() {
            Some(k) => k.clone(),
            None => return false,
        };
        if incoming_price <= lowest.gas_price() {
            return false;
        }

        let evicted = match index.remove(&lowest) {
            Some(hash) => hash,
            None => return false,
        };
        drop(index);

        if let Some((_, entry)) = self.transactions.remove(&evicted) {
            debug!(hash = %evicted, "evicted lowest-priced transaction");
            self.decrement_sender_count(&entry.sender);
        }
        true
    }

    fn remove_from_indices(&self, entry: &MempoolEntry) {
        self.price_index.write().remove(&PriceKey::for_entry(entry));
        self.decrement_sender_count(&entry.sender);
    }

    fn already_held(hash: String, reserved: bool) -> Result<Acceptance, MempoolError> {
        if reserved {
            debug!(hash = %hash, "transaction broadcast still in flight");
            Err(MempoolError::BroadcastInFlight { hash })
        } else {
            debug!(hash = %hash, "transaction already in mempool");
            Ok(Acceptance::AlreadyKnown)
        }
    }

    /// Checks the per-sender limit and takes a slot under one shard lock.
    fn take_sender_slot(&self, sender: &Address) -> Result<(), MempoolError> {
        let limit = self.config.max_per_sender;
        match self.sender_counts.entry(*sender) {
            Entry::Occupied(mut count) if *count.get() < limit => *count.get_mut() += 1,
            Entry::Vacant(slot) if limit > 0 => {
                slot.insert(1);
            }
            _ => {
                return Err(MempoolError::SenderLimitExceeded {
                    sender: sender.to_bech32(),
                    limit,
                })
            }
        }
        Ok(())
    }

    fn decrement_sender_count(&self, sender: &Address) {
        if let Entry::Occupied(mut count) = self.sender_counts.entry(*sender) {
            if *count.get() <= 1 {
                count.remove();
            } else {
                *count.get_mut() -= 1;
            }
        }
    }
}

impl SubmissionSink for Mempool {
    fn accept(&self, tx: &NativeTransaction) -> Result<Acceptance, MempoolError> {
        self.add(tx)
    }

    fn reserve(&self, tx: &NativeTransaction) -> Result<Acceptance, MempoolError> {
        self.add_pending(tx)
    }

    fn confirm(&self, hash: &str) -> bool {
        Mempool::confirm(self, hash)
    }

    fn release(&self, hash: &str) -> bool {
        self.remove(hash).is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CHAIN_ID_TESTNET;
    use crate::test_support::{public_key, signed_transfer};

    fn codec() -> TransactionCodec {
        TransactionCodec::new(CHAIN_ID_TESTNET)
    }

    fn pool() -> Mempool {
        Mempool::new(codec(), MempoolConfig::default())
    }

    fn pool_with(config: MempoolConfig) -> Mempool {
        Mempool::new(codec(), config)
    }

    /// Signed transfer from key `seed` with the given price and nonce.
    fn tx(seed: u8, gas_price: u128, nonce: u64) -> NativeTransaction {
        signed_transfer(&codec(), seed, nonce, gas_price)
    }

    fn hash_of(tx: &NativeTransaction) -> String {
        tx.id.clone().unwrap()
    }

    // -- Accept / idempotency -----------------------------------------------

    #[test]
    fn accept_and_retrieve() {
        let pool = pool();
        let t = tx(1, 100, 1);

        assert_eq!(pool.accept(&t).unwrap(), Acceptance::Accepted);
        assert_eq!(pool.get(&hash_of(&t)).unwrap(), t);
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn second_accept_is_a_no_op() {
        let pool = pool();
        let t = tx(1, 100, 1);

        pool.accept(&t).unwrap();
        assert_eq!(pool.accept(&t).unwrap(), Acceptance::AlreadyKnown);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.pending_for_sender(&t.sender()).len(), 1);
    }

    #[test]
    fn duplicate_accept_does_not_count_against_sender_limit() {
        let pool = pool_with(MempoolConfig {
            max_per_sender: 1,
            ..Default::default()
        });
        let t = tx(1, 100, 1);
        pool.accept(&t).unwrap();
        assert_eq!(pool.accept(&t).unwrap(), Acceptance::AlreadyKnown);
    }

    #[test]
    fn rejects_missing_hash() {
        let mut t = tx(1, 100, 1);
        t.id = None;
        assert_eq!(pool().accept(&t), Err(MempoolError::MissingHash));
    }

    #[test]
    fn rejects_tampered_content() {
        let mut t = tx(1, 100, 1);
        t.amount += 1;
        assert!(matches!(
            pool().accept(&t),
            Err(MempoolError::HashMismatch { .. })
        ));
    }

    #[test]
    fn rejects_unsigned() {
        let mut t = tx(1, 100, 1);
        t.signature = None;
        assert_eq!(pool().accept(&t), Err(MempoolError::Unsigned));
    }

    #[test]
    fn uppercase_declared_hash_is_accepted() {
        let mut t = tx(1, 100, 1);
        t.id = t.id.map(|h| h.to_uppercase());
        assert_eq!(pool().accept(&t).unwrap(), Acceptance::Accepted);
    }

    // -- Admission limits ---------------------------------------------------

    #[test]
    fn rejects_gas_price_below_minimum() {
        let pool = pool_with(MempoolConfig {
            min_gas_price: 1_000,
            ..Default::default()
        });
        assert_eq!(
            pool.accept(&tx(1, 999, 1)),
            Err(MempoolError::GasPriceTooLow { min: 1_000, got: 999 })
        );
        assert!(pool.accept(&tx(1, 1_000, 2)).is_ok());
    }

    #[test]
    fn enforces_sender_limit() {
        let pool = pool_with(MempoolConfig {
            max_per_sender: 2,
            ..Default::default()
        });
        pool.accept(&tx(1, 100, 1)).unwrap();
        pool.accept(&tx(1, 100, 2)).unwrap();

        let err = pool.accept(&tx(1, 100, 3)).unwrap_err();
        assert!(matches!(err, MempoolError::SenderLimitExceeded { limit: 2, .. }));
        assert!(err.is_retriable());

        // Another sender is unaffected.
        assert!(pool.accept(&tx(2, 100, 1)).is_ok());
    }

    #[test]
    fn full_pool_evicts_lowest_price() {
        let pool = pool_with(MempoolConfig {
            max_size: 2,
            ..Default::default()
        });
        let cheap = tx(1, 100, 1);
        pool.accept(&cheap).unwrap();
        pool.accept(&tx(2, 200, 1)).unwrap();

        pool.accept(&tx(3, 300, 1)).unwrap();
        assert_eq!(pool.size(), 2);
        assert!(!pool.contains(&hash_of(&cheap)));
        assert!(pool.pending_for_sender(&cheap.sender()).is_empty());
    }

    #[test]
    fn full_pool_rejects_when_incoming_is_cheapest() {
        let pool = pool_with(MempoolConfig {
            max_size: 2,
            ..Default::default()
        });
        pool.accept(&tx(1, 100, 1)).unwrap();
        pool.accept(&tx(2, 200, 1)).unwrap();

        let err = pool.accept(&tx(3, 100, 1)).unwrap_err();
        assert_eq!(err, MempoolError::MempoolFull { size: 2 });
        assert!(err.is_retriable());
    }

    #[test]
    fn duplicate_at_full_pool_evicts_nothing() {
        let pool = pool_with(MempoolConfig {
            max_size: 2,
            ..Default::default()
        });
        let cheap = tx(1, 100, 1);
        let rich = tx(2, 200, 1);
        pool.accept(&cheap).unwrap();
        pool.accept(&rich).unwrap();

        assert_eq!(pool.accept(&rich).unwrap(), Acceptance::AlreadyKnown);
        assert!(pool.contains(&hash_of(&cheap)));
        assert_eq!(pool.size(), 2);
    }

    // -- Reservation --------------------------------------------------------

    #[test]
    fn reserved_hash_refuses_duplicates_until_settled() {
        let pool = pool();
        let t = tx(1, 100, 1);
        let hash = hash_of(&t);

        assert_eq!(pool.reserve(&t).unwrap(), Acceptance::Accepted);
        let err = pool.accept(&t).unwrap_err();
        assert_eq!(err, MempoolError::BroadcastInFlight { hash: hash.clone() });
        assert!(err.is_retriable());
        assert!(matches!(
            pool.reserve(&t),
            Err(MempoolError::BroadcastInFlight { .. })
        ));

        assert!(pool.confirm(&hash));
        assert_eq!(pool.accept(&t).unwrap(), Acceptance::AlreadyKnown);
    }

    #[test]
    fn released_reservation_starts_over() {
        let pool = pool();
        let t = tx(1, 100, 1);

        pool.reserve(&t).unwrap();
        assert!(pool.release(&hash_of(&t)));
        assert!(!pool.confirm(&hash_of(&t)));
        assert!(pool.pending_for_sender(&t.sender()).is_empty());
        assert_eq!(pool.reserve(&t).unwrap(), Acceptance::Accepted);
    }

    #[test]
    fn reserved_entries_are_not_selected() {
        let pool = pool();
        let held = tx(1, 500, 1);
        pool.reserve(&held).unwrap();
        pool.accept(&tx(2, 100, 1)).unwrap();

        let prices: Vec<u128> = pool
            .select_transactions(10)
            .iter()
            .map(|t| t.gas_price)
            .collect();
        assert_eq!(prices, vec![100]);

        pool.confirm(&hash_of(&held));
        assert_eq!(pool.select_transactions(10).len(), 2);
    }

    // -- Selection / removal ------------------------------------------------

    #[test]
    fn select_returns_highest_price_first() {
        let pool = pool();
        pool.accept(&tx(1, 50, 1)).unwrap();
        pool.accept(&tx(2, 500, 1)).unwrap();
        pool.accept(&tx(3, 5, 1)).unwrap();

        let prices: Vec<u128> = pool
            .select_transactions(10)
            .iter()
            .map(|t| t.gas_price)
            .collect();
        assert_eq!(prices, vec![500, 50, 5]);
        assert_eq!(pool.select_transactions(1).len(), 1);
    }

    #[test]
    fn release_frees_sender_slot() {
        let pool = pool_with(MempoolConfig {
            max_per_sender: 1,
            ..Default::default()
        });
        let first = tx(1, 100, 1);
        pool.accept(&first).unwrap();
        assert!(pool.accept(&tx(1, 100, 2)).is_err());

        assert!(pool.release(&hash_of(&first)));
        assert!(!pool.release(&hash_of(&first)));
        assert!(pool.accept(&tx(1, 100, 2)).is_ok());
    }

    #[test]
    fn remove_batch_ignores_missing() {
        let pool = pool();
        let a = tx(1, 100, 1);
        let b = tx(2, 100, 1);
        pool.accept(&a).unwrap();
        pool.accept(&b).unwrap();

        pool.remove_batch(&[hash_of(&a), "not-there".to_string()]);
        assert_eq!(pool.size(), 1);
        assert!(pool.contains(&hash_of(&b)));
        assert_eq!(pool.select_transactions(10).len(), 1);
    }

    #[test]
    fn pending_for_sender_filters_by_address() {
        let pool = pool();
        pool.accept(&tx(1, 100, 1)).unwrap();
        pool.accept(&tx(1, 100, 2)).unwrap();
        pool.accept(&tx(2, 100, 1)).unwrap();

        let sender = Address::from_public_key(&public_key(1));
        assert_eq!(pool.pending_for_sender(&sender).len(), 2);
    }

    #[test]
    fn clear_empties_everything() {
        let pool = pool();
        pool.accept(&tx(1, 100, 1)).unwrap();
        pool.clear();
        assert!(pool.is_empty());
        assert!(pool.select_transactions(10).is_empty());
    }

    // -- Expiry -------------------------------------------------------------

    #[test]
    fn expiry_removes_entries_added_before_cutoff() {
        let pool = pool();
        pool.accept(&tx(1, 100, 1)).unwrap();
        pool.accept(&tx(2, 100, 1)).unwrap();

        let future = Utc::now().timestamp() + 10;
        assert_eq!(pool.expire_added_before(future), 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn expire_old_keeps_fresh_entries() {
        let pool = pool();
        pool.accept(&tx(1, 100, 1)).unwrap();
        assert_eq!(pool.expire_old(), 0);
        assert_eq!(pool.size(), 1);
    }

    // -- Thread safety ------------------------------------------------------

    #[test]
    fn concurrent_accepts_of_one_hash_insert_once() {
        use std::sync::Arc;
        use std::thread;

        let pool = Arc::new(pool());
        let t = tx(1, 100, 1);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let t = t.clone();
                thread::spawn(move || pool.accept(&t).unwrap())
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .filter(|a| *a == Acceptance::Accepted)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.select_transactions(10).len(), 1);
    }

    #[test]
    fn concurrent_accepts_respect_sender_limit() {
        use std::sync::Arc;
        use std::thread;

        let pool = Arc::new(pool_with(MempoolConfig {
            max_per_sender: 3,
            ..Default::default()
        }));
        let handles: Vec<_> = (1..=8u64)
            .map(|nonce| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || pool.accept(&tx(1, 100, nonce)).is_ok())
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 3);
        assert_eq!(pool.size(), 3);
        let sender = Address::from_public_key(&public_key(1));
        assert_eq!(pool.pending_for_sender(&sender).len(), 3);
    }

    #[test]
    fn concurrent_accept_and_select() {
        use std::sync::Arc;
        use std::thread;

        let pool = Arc::new(pool());
        let mut handles = vec![];

        for seed in 1..=6u8 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for nonce in 1..=10u64 {
                    let _ = pool.accept(&tx(seed, 100 + nonce as u128, nonce));
                }
            }));
        }
        for _ in 0..3 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    let _ = pool.size();
                    let _ = pool.select_transactions(5);
                }
            }));
        }

        for h in handles {
            h.join().expect("thread panicked");
        }
        assert_eq!(pool.size(), 60);
    }
}
