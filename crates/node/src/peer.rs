//! The capabilities one node can invoke on another.
//!
//! Protocol logic only ever talks to `dyn Peer`, so the same code drives an
//! in-process mesh in tests and an HTTP mesh in production.

use powmesh_core::Transaction;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors a peer call can fail with.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer {0} is unreachable")]
    Unreachable(String),

    #[error("peer rejected the request: {0}")]
    Rejected(String),

    #[error("invalid account path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PeerError>;

/// A remote (or local) participant of the mesh.
///
/// Calls are synchronous. Implementations must not hold internal locks while
/// calling into another peer.
pub trait Peer: Send + Sync {
    /// The unique address of this peer. Failure means the peer is gone.
    fn address(&self) -> Result<String>;

    /// Ask this peer to connect to `peer`.
    fn add_peer(&self, peer: Arc<dyn Peer>) -> Result<()>;

    fn list_peers(&self) -> Result<Vec<Arc<dyn Peer>>>;

    /// Deliver a pending transaction. Already-known transactions are ignored.
    fn add_transaction(&self, tx: Transaction) -> Result<()>;

    fn list_transactions(&self) -> Result<HashSet<Transaction>>;

    /// Drop a transaction from the pending set, typically after it was mined.
    fn remove_transaction(&self, tx: &Transaction) -> Result<()>;

    /// Create `path` (relative to the accounts directory) and its parents.
    fn create_directory(&self, path: &str) -> Result<()>;

    /// Write `content` to `path` (relative to the accounts directory).
    fn receive_file(&self, path: &str, content: &[u8]) -> Result<()>;
}
