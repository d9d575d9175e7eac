//! In-process peer handle with an on/off switch.
//!
//! Wraps a [`PeerNode`] so that a test can make it "leave" the mesh: while
//! unreachable every call fails with [`PeerError::Unreachable`].

use crate::node::PeerNode;
use crate::peer::{Peer, PeerError, Result};
use powmesh_core::Transaction;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct LocalPeer {
    node: Arc<PeerNode>,
    reachable: AtomicBool,
}

impl LocalPeer {
    pub fn new(node: Arc<PeerNode>) -> Arc<Self> {
        Arc::new(Self {
            node,
            reachable: AtomicBool::new(true),
        })
    }

    pub fn node(&self) -> &Arc<PeerNode> {
        &self.node
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_reachable() {
            Ok(())
        } else {
            Err(PeerError::Unreachable(self.node.local_address().to_string()))
        }
    }
}

impl Peer for LocalPeer {
    fn address(&self) -> Result<String> {
        self.check()?;
        self.node.address()
    }

    fn add_peer(&self, peer: Arc<dyn Peer>) -> Result<()> {
        self.check()?;
        self.node.add_peer(peer)
    }

    fn list_peers(&self) -> Result<Vec<Arc<dyn Peer>>> {
        self.check()?;
        self.node.list_peers()
    }

    fn add_transaction(&self, tx: Transaction) -> Result<()> {
        self.check()?;
        self.node.add_transaction(tx)
    }

    fn list_transactions(&self) -> Result<HashSet<Transaction>> {
        self.check()?;
        self.node.list_transactions()
    }

    fn remove_transaction(&self, tx: &Transaction) -> Result<()> {
        self.check()?;
        self.node.remove_transaction(tx)
    }

    fn create_directory(&self, path: &str) -> Result<()> {
        self.check()?;
        self.node.create_directory(path)
    }

    fn receive_file(&self, path: &str, content: &[u8]) -> Result<()> {
        self.check()?;
        self.node.receive_file(path, content)
    }
}
