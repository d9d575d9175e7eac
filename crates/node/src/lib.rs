//! Peer mesh replication for powmesh.
//!
//! - [`Peer`]: the calls one node makes on another, independent of transport
//! - [`PeerNode`]: joins a mesh, floods pending transactions, replicates
//!   its accounts directory and mines
//! - [`LocalPeer`]: in-process handle that can be switched off
//! - [`NodeConfig`]: the `config.json` of a node
//!
//! # Example
//!
//! ```rust,no_run
//! use powmesh_chain::Ledger;
//! use powmesh_consensus::PowConfig;
//! use powmesh_core::{Keypair, Transaction};
//! use powmesh_node::{AccountDirectory, PeerNode};
//!
//! let a = PeerNode::new("a", Ledger::new(PowConfig::new(2, 2)).unwrap(), AccountDirectory::new("./a"));
//! let b = PeerNode::new("b", Ledger::new(PowConfig::new(2, 2)).unwrap(), AccountDirectory::new("./b"));
//! b.join(a.clone()).unwrap();
//!
//! a.submit_transaction(Transaction::signed("hello", &Keypair::generate()));
//! assert_eq!(b.ledger().pending().len(), 1);
//! ```

pub mod config;
pub mod local;
pub mod node;
pub mod peer;
pub mod sync;

// Re-export commonly used types
pub use config::{ConfigError, NodeConfig};
pub use local::LocalPeer;
pub use node::{NodeError, NodeState, PeerNode};
pub use peer::{Peer, PeerError};
pub use sync::{AccountDirectory, AccountEntry};
