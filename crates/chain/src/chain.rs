//! The append-only chain of sealed blocks.

use powmesh_consensus::{BlockValidator, ValidationError};
use powmesh_core::{Block, Hash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while extending or restoring a chain.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("block is already part of the chain")]
    DuplicateBlock,

    #[error("block does not extend the chain (expected parent {expected}, got {got})")]
    BrokenLink { expected: Hash, got: Hash },

    #[error("block has not been sealed")]
    Unsealed,

    #[error("block {height} failed validation: {source}")]
    Invalid {
        height: usize,
        #[source]
        source: ValidationError,
    },

    #[error("persistence error: {0}")]
    Persistence(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// Ordered, append-only sequence of sealed blocks.
///
/// Every block after the first references the hash of its predecessor. The
/// first block references [`Hash::ZERO`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sealed block that extends the current tip.
    pub fn append(&mut self, block: Block) -> Result<()> {
        if self.blocks.contains(&block) {
            return Err(ChainError::DuplicateBlock);
        }

        let expected = self.last_block_hash();
        if block.previous_hash() != expected {
            return Err(ChainError::BrokenLink {
                expected,
                got: block.previous_hash(),
            });
        }

        if !block.is_finalized() {
            return Err(ChainError::Unsealed);
        }

        self.blocks.push(block);
        Ok(())
    }

    /// Undo the last append.
    pub(crate) fn pop(&mut self) -> Option<Block> {
        self.blocks.pop()
    }

    /// Check that every block links to its predecessor.
    pub fn is_valid(&self) -> bool {
        self.blocks
            .windows(2)
            .all(|pair| pair[0].hash() == Some(pair[1].previous_hash()))
    }

    /// Replay every block against `difficulty`: links, hashes, merkle roots
    /// and proof of work.
    pub fn verify(&self, difficulty: u32) -> Result<()> {
        let mut parent = Hash::ZERO;
        for (height, block) in self.blocks.iter().enumerate() {
            BlockValidator::validate_full(block, parent, difficulty)
                .map_err(|source| ChainError::Invalid { height, source })?;
            parent = block.hash().ok_or(ChainError::Unsealed)?;
        }
        Ok(())
    }

    /// Hash of the tip, or the zero sentinel for an empty chain.
    pub fn last_block_hash(&self) -> Hash {
        self.blocks
            .last()
            .and_then(Block::hash)
            .unwrap_or(Hash::ZERO)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, height: usize) -> Option<&Block> {
        self.blocks.get(height)
    }

    pub fn last(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Encode the full block list.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a chain previously produced by [`Chain::snapshot`].
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Replace this chain wholesale with a decoded snapshot.
    ///
    /// The chain is untouched when decoding fails.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        *self = Self::from_snapshot(bytes)?;
        Ok(())
    }
}
