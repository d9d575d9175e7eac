//! In-process mesh tests.

use powmesh_chain::Ledger;
use powmesh_consensus::PowConfig;
use powmesh_core::{Keypair, Transaction};
use powmesh_node::{AccountDirectory, LocalPeer, NodeState, Peer, PeerError, PeerNode};
use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tempfile::TempDir;

struct TestNode {
    node: Arc<PeerNode>,
    handle: Arc<LocalPeer>,
    accounts: TempDir,
}

fn spawn(address: &str) -> TestNode {
    let accounts = tempfile::tempdir().unwrap();
    let ledger = Ledger::new(PowConfig::new(1, 2)).unwrap();
    let node = PeerNode::new(address, ledger, AccountDirectory::new(accounts.path()));
    let handle = LocalPeer::new(Arc::clone(&node));
    TestNode {
        node,
        handle,
        accounts,
    }
}

fn sorted(mut addresses: Vec<String>) -> Vec<String> {
    addresses.sort();
    addresses
}

fn record(content: &str) -> Transaction {
    Transaction::signed(content, &Keypair::generate())
}

/// Forwards to `inner`, but the first `add_peer` call fails.
struct FlakyHandshake {
    inner: Arc<LocalPeer>,
    failed: AtomicBool,
}

impl Peer for FlakyHandshake {
    fn address(&self) -> Result<String, PeerError> {
        self.inner.address()
    }
    fn add_peer(&self, peer: Arc<dyn Peer>) -> Result<(), PeerError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(PeerError::Unreachable("handshake dropped".into()));
        }
        self.inner.add_peer(peer)
    }
    fn list_peers(&self) -> Result<Vec<Arc<dyn Peer>>, PeerError> {
        self.inner.list_peers()
    }
    fn add_transaction(&self, tx: Transaction) -> Result<(), PeerError> {
        self.inner.add_transaction(tx)
    }
    fn list_transactions(&self) -> Result<HashSet<Transaction>, PeerError> {
        self.inner.list_transactions()
    }
    fn remove_transaction(&self, tx: &Transaction) -> Result<(), PeerError> {
        self.inner.remove_transaction(tx)
    }
    fn create_directory(&self, path: &str) -> Result<(), PeerError> {
        self.inner.create_directory(path)
    }
    fn receive_file(&self, path: &str, content: &[u8]) -> Result<(), PeerError> {
        self.inner.receive_file(path, content)
    }
}

/// A peer that stops answering and, the first time its address is asked for, lets
/// `replacement` take over its address on `owner`.
struct Replaced {
    address: String,
    owner: Weak<PeerNode>,
    replacement: Arc<dyn Peer>,
    reachable: AtomicBool,
    replaced: AtomicBool,
}

impl Peer for Replaced {
    fn address(&self) -> Result<String, PeerError> {
        if self.reachable.load(Ordering::SeqCst) {
            return Ok(self.address.clone());
        }
        if !self.replaced.swap(true, Ordering::SeqCst) {
            if let Some(owner) = self.owner.upgrade() {
                owner.prune_peers();
                owner.add_peer(Arc::clone(&self.replacement))?;
            }
        }
        Err(PeerError::Unreachable(self.address.clone()))
    }
    fn add_peer(&self, _peer: Arc<dyn Peer>) -> Result<(), PeerError> {
        Ok(())
    }
    fn list_peers(&self) -> Result<Vec<Arc<dyn Peer>>, PeerError> {
        Ok(Vec::new())
    }
    fn add_transaction(&self, _tx: Transaction) -> Result<(), PeerError> {
        Ok(())
    }
    fn list_transactions(&self) -> Result<HashSet<Transaction>, PeerError> {
        Ok(HashSet::new())
    }
    fn remove_transaction(&self, _tx: &Transaction) -> Result<(), PeerError> {
        Ok(())
    }
    fn create_directory(&self, _path: &str) -> Result<(), PeerError> {
        Ok(())
    }
    fn receive_file(&self, _path: &str, _content: &[u8]) -> Result<(), PeerError> {
        Ok(())
    }
}

#[test]
fn test_three_nodes_form_full_mesh() {
    let a = spawn("node-a");
    let b = spawn("node-b");
    let c = spawn("node-c");

    b.node.join(a.handle.clone()).unwrap();
    c.node.join(a.handle.clone()).unwrap();

    assert_eq!(sorted(a.node.peer_addresses()), vec!["node-b", "node-c"]);
    assert_eq!(sorted(b.node.peer_addresses()), vec!["node-a", "node-c"]);
    assert_eq!(sorted(c.node.peer_addresses()), vec!["node-a", "node-b"]);
    assert_eq!(b.node.state(), NodeState::Joined);
    assert_eq!(c.node.state(), NodeState::Joined);
}

#[test]
fn test_gossip_reaches_every_node_once() {
    let a = spawn("node-a");
    let b = spawn("node-b");
    let c = spawn("node-c");
    b.node.join(a.handle.clone()).unwrap();
    c.node.join(a.handle.clone()).unwrap();

    let tx = record("gossip me");
    assert!(a.node.submit_transaction(tx.clone()));

    // Redundant delivery from another node is a no-op.
    assert!(!c.node.submit_transaction(tx.clone()));
    b.node.add_transaction(tx.clone()).unwrap();

    for node in [&a.node, &b.node, &c.node] {
        let pending = node.list_transactions().unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending.contains(&tx));
    }
}

#[test]
fn test_mining_retracts_transactions_from_peers() {
    let a = spawn("node-a");
    let b = spawn("node-b");
    b.node.join(a.handle.clone()).unwrap();

    a.node.submit_transaction(record("one"));
    a.node.submit_transaction(record("two"));
    assert_eq!(b.node.ledger().pending().len(), 2);

    let block = a.node.mine_pending().unwrap().unwrap();

    assert_eq!(block.transactions().len(), 2);
    assert_eq!(a.node.ledger().height(), 1);
    assert!(a.node.ledger().pending().is_empty());
    assert!(b.node.ledger().pending().is_empty());
    // Blocks are not gossiped.
    assert_eq!(b.node.ledger().height(), 0);
}

#[test]
fn test_departed_peer_pruned_on_next_add() {
    let a = spawn("node-a");
    let b = spawn("node-b");
    let c = spawn("node-c");

    a.node.add_peer(b.handle.clone()).unwrap();
    assert_eq!(a.node.peer_addresses(), vec!["node-b"]);

    b.handle.set_reachable(false);
    a.node.add_peer(c.handle.clone()).unwrap();

    assert_eq!(a.node.peer_addresses(), vec!["node-c"]);
}

#[test]
fn test_unreachable_bootstrap_leaves_node_idle() {
    let a = spawn("node-a");
    let b = spawn("node-b");
    a.handle.set_reachable(false);

    let err = b.node.join(a.handle.clone()).unwrap_err();

    assert!(err.to_string().contains("unreachable"));
    assert_eq!(b.node.state(), NodeState::Idle);
    assert!(b.node.peer_addresses().is_empty());
}

#[test]
fn test_accounts_replicated_on_join() {
    let a = spawn("node-a");
    let b = spawn("node-b");

    let alice = a.accounts.path().join("alice");
    fs::create_dir_all(alice.join("keys")).unwrap();
    fs::write(alice.join("profile.json"), br#"{"name":"alice"}"#).unwrap();
    fs::write(alice.join("keys/main.pub"), [0xAB; 32]).unwrap();
    fs::write(b.accounts.path().join("bob.txt"), b"bob").unwrap();

    b.node.join(a.handle.clone()).unwrap();

    let replicated = b.accounts.path().join("alice");
    assert_eq!(
        fs::read(replicated.join("profile.json")).unwrap(),
        br#"{"name":"alice"}"#
    );
    assert_eq!(fs::read(replicated.join("keys/main.pub")).unwrap(), vec![0xAB; 32]);
    // Sync is push-only in both directions.
    assert_eq!(fs::read(a.accounts.path().join("bob.txt")).unwrap(), b"bob");
}

#[test]
fn test_receive_rejects_path_traversal() {
    let a = spawn("node-a");

    for path in ["../escape.txt", "/etc/powmesh", "alice/../../escape.txt"] {
        assert!(matches!(
            a.node.receive_file(path, b"x"),
            Err(PeerError::InvalidPath(_))
        ));
    }
    assert!(matches!(
        a.node.create_directory(".."),
        Err(PeerError::InvalidPath(_))
    ));
    assert!(!a.accounts.path().parent().unwrap().join("escape.txt").exists());
}

#[test]
fn test_list_peers_returns_handles() {
    let a = spawn("node-a");
    let b = spawn("node-b");
    a.node.add_peer(b.handle.clone()).unwrap();

    let peers = a.node.list_peers().unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].address().unwrap(), "node-b");
}

#[test]
fn test_failed_handshake_is_retried_on_next_join() {
    let a = spawn("node-a");
    let b = spawn("node-b");
    let flaky = Arc::new(FlakyHandshake {
        inner: a.handle.clone(),
        failed: AtomicBool::new(false),
    });

    assert!(b.node.join(flaky.clone()).is_err());
    assert_eq!(b.node.state(), NodeState::Idle);
    assert!(b.node.peer_addresses().is_empty());
    assert!(a.node.peer_addresses().is_empty());

    b.node.join(flaky).unwrap();
    assert_eq!(b.node.state(), NodeState::Joined);
    assert_eq!(b.node.peer_addresses(), vec!["node-a"]);
    assert_eq!(a.node.peer_addresses(), vec!["node-b"]);

    let tx = record("after retry");
    a.node.submit_transaction(tx.clone());
    assert!(b.node.ledger().pending().contains(&tx));
}

#[test]
fn test_unreachable_peer_does_not_block_gossip() {
    let a = spawn("node-a");
    let b = spawn("node-b");
    let c = spawn("node-c");
    a.node.add_peer(b.handle.clone()).unwrap();
    a.node.add_peer(c.handle.clone()).unwrap();

    b.handle.set_reachable(false);
    let tx = record("route around b");
    assert!(a.node.submit_transaction(tx.clone()));

    assert!(a.node.ledger().pending().contains(&tx));
    assert!(c.node.ledger().pending().contains(&tx));
    // Gossip failures are logged, not pruned.
    assert_eq!(sorted(a.node.peer_addresses()), vec!["node-b", "node-c"]);
}

#[test]
fn test_prune_keeps_peer_re_added_under_same_address() {
    let a = spawn("node-a");
    let c = spawn("node-c");
    let stale = Arc::new(Replaced {
        address: "node-c".into(),
        owner: Arc::downgrade(&a.node),
        replacement: c.handle.clone(),
        reachable: AtomicBool::new(true),
        replaced: AtomicBool::new(false),
    });
    a.node.add_peer(stale.clone()).unwrap();
    assert_eq!(a.node.peer_addresses(), vec!["node-c"]);

    stale.reachable.store(false, Ordering::SeqCst);
    let removed = a.node.prune_peers();

    assert!(removed.is_empty());
    assert_eq!(a.node.peer_addresses(), vec!["node-c"]);
    let peers = a.node.list_peers().unwrap();
    assert_eq!(peers[0].address().unwrap(), "node-c");
    assert_eq!(c.node.peer_addresses(), vec!["node-a"]);
}
