//! Block and transaction validation rules.
//!
//! Used when replaying a chain that was restored from disk, and at the
//! node boundary before a record enters the pending set.

use powmesh_core::{Block, Hash, PublicKey, Transaction};
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("transaction signature verification failed")]
    InvalidSignature,

    #[error("block is not sealed")]
    Unsealed,

    #[error("block hash does not match its contents")]
    InvalidHash,

    #[error("block hash has {found} leading zeros, difficulty requires {required}")]
    InsufficientWork { required: u32, found: u32 },

    #[error("block merkle root verification failed")]
    InvalidMerkleRoot,

    #[error("block previous_hash mismatch (expected {expected}, got {got})")]
    InvalidPrevHash { expected: Hash, got: Hash },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Transaction validator.
pub struct TransactionValidator;

impl TransactionValidator {
    /// Check that `public_key` owns the author address and signed the record.
    pub fn validate_with_signature(tx: &Transaction, public_key: &PublicKey) -> Result<()> {
        tx.verify(public_key)
            .map_err(|_| ValidationError::InvalidSignature)
    }
}

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// The merkle tree is internally consistent and matches the header root.
    pub fn validate_block_structure(block: &Block) -> Result<()> {
        if !block.verify_merkle_root() {
            return Err(ValidationError::InvalidMerkleRoot);
        }
        Ok(())
    }

    /// The block is sealed, its hash recomputes, and it has enough leading zeros.
    pub fn validate_proof_of_work(block: &Block, difficulty: u32) -> Result<()> {
        let sealed = block.hash().ok_or(ValidationError::Unsealed)?;

        if !block.is_valid() {
            return Err(ValidationError::InvalidHash);
        }

        if !sealed.meets_difficulty(difficulty) {
            return Err(ValidationError::InsufficientWork {
                required: difficulty,
                found: sealed.leading_zeros_hex(),
            });
        }

        Ok(())
    }

    /// Validate block extends the parent correctly.
    pub fn validate_block_extends_parent(block: &Block, parent_hash: Hash) -> Result<()> {
        if block.previous_hash() != parent_hash {
            return Err(ValidationError::InvalidPrevHash {
                expected: parent_hash,
                got: block.previous_hash(),
            });
        }
        Ok(())
    }

    /// Full block validation (structure + proof of work + parent link).
    pub fn validate_full(block: &Block, parent_hash: Hash, difficulty: u32) -> Result<()> {
        Self::validate_block_structure(block)?;
        Self::validate_proof_of_work(block, difficulty)?;
        Self::validate_block_extends_parent(block, parent_hash)?;
        Ok(())
    }
}
