//! Persistent storage layer for powmesh.
//!
//! This crate provides the storage backend for the ledger:
//! - Chain snapshots (the unit the ledger restores from)
//! - Block indexes by height and hash
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Ledger (powmesh-chain)                │
//! └────────────────────────┬────────────────────────────────┘
//!                          │ snapshot bytes + blocks
//! ┌────────────────────────▼────────────────────────────────┐
//! │                   Storage Layer                          │
//! │  ┌──────────────────────┐  ┌──────────────────────────┐  │
//! │  │ ChainStore           │  │ Storage (DB)             │  │
//! │  │  - snapshot          │  │  - sled wrapper          │  │
//! │  │  - height/hash index │  │  - bincode helpers       │  │
//! │  └──────────────────────┘  └──────────────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                    sled Database                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use powmesh_storage::{ChainStore, Storage};
//!
//! let storage = Storage::open("./powmesh_data").unwrap();
//! let chain = ChainStore::new(storage);
//! if let Some(snapshot) = chain.load_snapshot().unwrap() {
//!     println!("stored chain snapshot is {} bytes", snapshot.len());
//! }
//! ```

pub mod chain;
pub mod db;

// Re-export commonly used types
pub use chain::ChainStore;
pub use db::{BatchOp, Result, Storage, StorageError};
