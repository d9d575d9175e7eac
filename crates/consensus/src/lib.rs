//! Proof of Work consensus for powmesh.
//!
//! This crate provides:
//! - A parallel nonce search with first-winner-takes-all termination
//! - A [`Miner`] that seals blocks at a configured difficulty
//! - Block validation (merkle root, proof of work, parent links)
//!
//! Difficulty counts leading `'0'` hex characters of a block hash. Mining,
//! sealing and validation all use that same prefix rule.
//!
//! # Example
//!
//! ```rust,no_run
//! use powmesh_consensus::{BlockValidator, Miner, PowConfig};
//! use powmesh_core::{Block, Hash, Keypair, Transaction};
//!
//! let keypair = Keypair::generate();
//! let tx = Transaction::signed("hello", &keypair);
//! let mut block = Block::new(Hash::ZERO, &[tx]).unwrap();
//!
//! let miner = Miner::new(PowConfig::new(3, 4)).unwrap();
//! miner.seal(&mut block).unwrap();
//!
//! BlockValidator::validate_full(&block, Hash::ZERO, 3).unwrap();
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{
    find_nonce, find_nonce_cancellable, CancelToken, ConsensusError, Miner, PowConfig,
    MAX_DIFFICULTY, MAX_NONCE,
};
pub use validator::{BlockValidator, TransactionValidator, ValidationError};
