//! Core ledger primitives for powmesh.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Hashing (Blake3 digests rendered as uppercase hex)
//! - Merkle trees with inclusion proofs
//! - Signed records (transactions) and Ed25519 keys
//! - Blocks sealed by proof of work

pub mod block;
pub mod crypto;
pub mod hash;
pub mod merkle;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, BlockError};
pub use crypto::{Address, CryptoError, Keypair, PublicKey, Signature};
pub use hash::{hash, hash_concat, hash_pair, hash_with_nonce, Hash, H256};
pub use merkle::{leaf_hash, MerkleError, MerkleTree};
pub use transaction::{Transaction, TransactionError};
