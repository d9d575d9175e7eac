//! Ledger orchestration for powmesh.
//!
//! This crate brings the lower layers together:
//! - **Chain**: the append-only, hash-linked sequence of sealed blocks
//! - **PendingSet**: transactions waiting to be mined
//! - **Ledger**: mines the pending set into blocks and persists the chain
//!
//! # Example
//!
//! ```rust,no_run
//! use powmesh_chain::Ledger;
//! use powmesh_consensus::PowConfig;
//! use powmesh_core::{Keypair, Transaction};
//! use powmesh_storage::{ChainStore, Storage};
//!
//! let storage = Storage::open("./powmesh_data").unwrap();
//! let ledger = Ledger::open(PowConfig::new(4, 4), ChainStore::new(storage)).unwrap();
//!
//! let keypair = Keypair::generate();
//! ledger.submit(Transaction::signed("hello", &keypair));
//!
//! if let Some(block) = ledger.mine_pending().unwrap() {
//!     println!("mined {:?}", block.hash());
//! }
//! ```

pub mod chain;
pub mod ledger;
pub mod mempool;

// Re-export commonly used types
pub use chain::{Chain, ChainError};
pub use ledger::{Ledger, LedgerError, LedgerStats};
pub use mempool::PendingSet;
