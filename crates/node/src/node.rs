//! A participant of the peer mesh.
//!
//! A node keeps a full mesh: every node it learns about is introduced to all
//! of its other peers, and every new pending transaction is forwarded to all
//! of them. Duplicate deliveries are dropped before anything is re-forwarded,
//! which is what stops the flood.

use crate::config::{ConfigError, NodeConfig};
use crate::peer::{self, Peer, PeerError};
use crate::sync::AccountDirectory;
use parking_lot::RwLock;
use powmesh_chain::{Ledger, LedgerError};
use powmesh_core::{Block, Transaction};
use powmesh_storage::{ChainStore, Storage, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Errors that can occur during node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("peer error: {0}")]
    Peer(#[from] PeerError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NodeError>;

/// Where a node is in joining the mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    #[default]
    Idle,
    Joining,
    Joined,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Idle => "idle",
            NodeState::Joining => "joining",
            NodeState::Joined => "joined",
        };
        f.write_str(name)
    }
}

/// A ledger node connected to a mesh of peers.
pub struct PeerNode {
    address: String,
    ledger: Ledger,
    accounts: AccountDirectory,
    peers: RwLock<BTreeMap<String, Arc<dyn Peer>>>,
    state: RwLock<NodeState>,
    /// Handed to peers so they can call back into this node.
    this: Weak<PeerNode>,
}

impl PeerNode {
    pub fn new(address: impl Into<String>, ledger: Ledger, accounts: AccountDirectory) -> Arc<Self> {
        let address = address.into();
        Arc::new_cyclic(|this| Self {
            address,
            ledger,
            accounts,
            peers: RwLock::new(BTreeMap::new()),
            state: RwLock::new(NodeState::Idle),
            this: this.clone(),
        })
    }

    /// Open the persistent ledger and accounts directory described by `config`.
    pub fn open(config: &NodeConfig) -> Result<Arc<Self>> {
        config.validate()?;
        fs::create_dir_all(&config.accounts_dir)?;

        let storage = Storage::open(config.chain_dir())?;
        let ledger = Ledger::open(config.pow_config(), ChainStore::new(storage))?;

        Ok(Self::new(
            config.address.clone(),
            ledger,
            AccountDirectory::new(&config.accounts_dir),
        ))
    }

    pub fn local_address(&self) -> &str {
        &self.address
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    pub fn state(&self) -> NodeState {
        *self.state.read()
    }

    pub fn peer_addresses(&self) -> Vec<String> {
        self.peers.read().keys().cloned().collect()
    }

    fn known_peers(&self) -> Vec<(String, Arc<dyn Peer>)> {
        self.peers
            .read()
            .iter()
            .map(|(address, peer)| (address.clone(), Arc::clone(peer)))
            .collect()
    }

    fn handle(&self) -> peer::Result<Arc<dyn Peer>> {
        self.this
            .upgrade()
            .map(|node| node as Arc<dyn Peer>)
            .ok_or_else(|| PeerError::Rejected("node is shutting down".into()))
    }

    /// Drop every known peer that no longer answers `address()`.
    ///
    /// Returns the addresses that were removed. An entry replaced while the
    /// address checks ran is left alone.
    pub fn prune_peers(&self) -> Vec<String> {
        let departed: Vec<(String, Arc<dyn Peer>)> = self
            .known_peers()
            .into_iter()
            .filter(|(_, peer)| peer.address().is_err())
            .collect();

        let mut removed = Vec::new();
        for (address, peer) in departed {
            if self.forget(&address, &peer) {
                tracing::warn!(peer = %address, "pruned unreachable peer");
                removed.push(address);
            }
        }
        removed
    }

    /// Remove `address` only if it still maps to `peer`.
    fn forget(&self, address: &str, peer: &Arc<dyn Peer>) -> bool {
        let mut peers = self.peers.write();
        match peers.get(address) {
            Some(current) if Arc::ptr_eq(current, peer) => {
                peers.remove(address);
                true
            }
            _ => false,
        }
    }

    fn connect(&self, remote: Arc<dyn Peer>) -> peer::Result<()> {
        self.prune_peers();

        let address = remote.address()?;
        if address == self.address {
            return Ok(());
        }

        {
            let mut peers = self.peers.write();
            if peers.contains_key(&address) {
                return Ok(());
            }
            peers.insert(address.clone(), Arc::clone(&remote));
        }
        tracing::info!(peer = %address, "peer added");

        if let Err(err) = self.handle().and_then(|this| remote.add_peer(this)) {
            self.forget(&address, &remote);
            tracing::warn!(peer = %address, error = %err, "handshake failed, peer dropped");
            return Err(err);
        }

        if let Err(err) = self.accounts.push_to(remote.as_ref()) {
            tracing::warn!(peer = %address, error = %err, "account sync failed");
        }

        for (other_address, other) in self.known_peers() {
            if other_address == address {
                continue;
            }
            if let Err(err) = other.add_peer(Arc::clone(&remote)) {
                tracing::warn!(
                    peer = %other_address,
                    new_peer = %address,
                    error = %err,
                    "failed to introduce peer"
                );
            }
        }
        Ok(())
    }

    /// Add a transaction to the pending set and forward it to every peer.
    ///
    /// Returns `false`, without forwarding, if it was already pending.
    pub fn submit_transaction(&self, tx: Transaction) -> bool {
        if !self.ledger.submit(tx.clone()) {
            return false;
        }
        tracing::debug!(tx = %tx.hash(), "transaction added to pending set");

        for (address, peer) in self.known_peers() {
            if let Err(err) = peer.add_transaction(tx.clone()) {
                tracing::warn!(peer = %address, error = %err, "failed to forward transaction");
            }
        }
        true
    }

    /// Union the remote's pending set into ours, returning how many were new.
    pub fn sync_transactions(&self, remote: &dyn Peer) -> peer::Result<usize> {
        let transactions = remote.list_transactions()?;
        let added = self.ledger.pending().extend(transactions);
        tracing::debug!(added, "synced pending transactions");
        Ok(added)
    }

    /// Join the mesh through `bootstrap`.
    ///
    /// On failure the node returns to the state it was in before.
    pub fn join(&self, bootstrap: Arc<dyn Peer>) -> Result<()> {
        let previous = std::mem::replace(&mut *self.state.write(), NodeState::Joining);

        let joined = self
            .connect(Arc::clone(&bootstrap))
            .and_then(|()| self.sync_transactions(bootstrap.as_ref()));

        match joined {
            Ok(_) => {
                *self.state.write() = NodeState::Joined;
                tracing::info!(peers = self.peers.read().len(), "joined mesh");
                Ok(())
            }
            Err(err) => {
                *self.state.write() = previous;
                Err(err.into())
            }
        }
    }

    /// Mine the pending set and tell every peer to drop the mined transactions.
    pub fn mine_pending(&self) -> Result<Option<Block>> {
        let Some(block) = self.ledger.mine_pending()? else {
            return Ok(None);
        };

        for (address, peer) in self.known_peers() {
            for tx in block.transactions() {
                if let Err(err) = peer.remove_transaction(tx) {
                    tracing::warn!(peer = %address, error = %err, "failed to retract mined transaction");
                    break;
                }
            }
        }
        Ok(Some(block))
    }
}

impl Peer for PeerNode {
    fn address(&self) -> peer::Result<String> {
        Ok(self.address.clone())
    }

    fn add_peer(&self, peer: Arc<dyn Peer>) -> peer::Result<()> {
        self.connect(peer)
    }

    fn list_peers(&self) -> peer::Result<Vec<Arc<dyn Peer>>> {
        Ok(self.known_peers().into_iter().map(|(_, peer)| peer).collect())
    }

    fn add_transaction(&self, tx: Transaction) -> peer::Result<()> {
        self.submit_transaction(tx);
        Ok(())
    }

    fn list_transactions(&self) -> peer::Result<HashSet<Transaction>> {
        Ok(self.ledger.pending().to_set())
    }

    fn remove_transaction(&self, tx: &Transaction) -> peer::Result<()> {
        self.ledger.pending().remove(tx);
        Ok(())
    }

    fn create_directory(&self, path: &str) -> peer::Result<()> {
        self.accounts.create_directory(path)
    }

    fn receive_file(&self, path: &str, content: &[u8]) -> peer::Result<()> {
        self.accounts.write_file(path, content)
    }
}
