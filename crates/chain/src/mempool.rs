//! Pending transactions waiting to be mined.
//!
//! The pending set is shared between request handlers, gossip and the miner,
//! so every operation takes the internal lock for exactly its own duration.

use parking_lot::RwLock;
use powmesh_core::Transaction;
use std::collections::HashSet;

/// Concurrent set of pending transactions, deduplicated by value.
#[derive(Debug, Default)]
pub struct PendingSet {
    transactions: RwLock<HashSet<Transaction>>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transaction. Returns `false` if it was already pending.
    pub fn insert(&self, tx: Transaction) -> bool {
        self.transactions.write().insert(tx)
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        self.transactions.read().contains(tx)
    }

    /// Remove a transaction. Returns `false` if it was not pending.
    pub fn remove(&self, tx: &Transaction) -> bool {
        self.transactions.write().remove(tx)
    }

    /// Remove every transaction in `txs`, returning how many were pending.
    pub fn remove_all(&self, txs: &[Transaction]) -> usize {
        let mut pending = self.transactions.write();
        txs.iter().filter(|tx| pending.remove(*tx)).count()
    }

    /// Union `txs` into the set, returning how many were new.
    pub fn extend<I>(&self, txs: I) -> usize
    where
        I: IntoIterator<Item = Transaction>,
    {
        let mut pending = self.transactions.write();
        txs.into_iter().filter(|tx| pending.insert(tx.clone())).count()
    }

    /// Pending transactions ordered by leaf hash.
    ///
    /// The order is stable so that the same set always yields the same block.
    pub fn snapshot(&self) -> Vec<Transaction> {
        let mut txs: Vec<_> = self.transactions.read().iter().cloned().collect();
        txs.sort_by_key(Transaction::hash);
        txs
    }

    pub fn to_set(&self) -> HashSet<Transaction> {
        self.transactions.read().clone()
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }

    pub fn clear(&self) {
        self.transactions.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powmesh_core::Keypair;
    use std::sync::Arc;
    use std::thread;

    fn tx(content: &str) -> Transaction {
        Transaction::signed(content, &Keypair::generate())
    }

    #[test]
    fn test_insert_and_contains() {
        let pending = PendingSet::new();
        let a = tx("a");

        assert!(pending.insert(a.clone()));
        assert!(pending.contains(&a));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_ignored() {
        let pending = PendingSet::new();
        let a = tx("a");

        assert!(pending.insert(a.clone()));
        assert!(!pending.insert(a));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_remove() {
        let pending = PendingSet::new();
        let a = tx("a");
        pending.insert(a.clone());

        assert!(pending.remove(&a));
        assert!(!pending.remove(&a));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_extend_is_union() {
        let pending = PendingSet::new();
        let (a, b, c) = (tx("a"), tx("b"), tx("c"));
        pending.insert(a.clone());

        assert_eq!(pending.extend(vec![a, b, c.clone()]), 2);
        assert_eq!(pending.len(), 3);

        assert_eq!(pending.remove_all(&[c, tx("absent")]), 1);
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let pending = PendingSet::new();
        for content in ["x", "y", "z", "w"] {
            pending.insert(tx(content));
        }

        let hashes: Vec<_> = pending.snapshot().iter().map(Transaction::hash).collect();
        let mut sorted = hashes.clone();
        sorted.sort();
        assert_eq!(hashes, sorted);
    }

    #[test]
    fn test_concurrent_inserts_keep_one_copy() {
        let pending = Arc::new(PendingSet::new());
        let shared = tx("shared");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pending = Arc::clone(&pending);
                let shared = shared.clone();
                thread::spawn(move || pending.insert(shared))
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|inserted| *inserted)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(pending.len(), 1);
    }
}
