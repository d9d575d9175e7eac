//! Ledger blocks.

use crate::hash::{hash_with_nonce, Hash};
use crate::merkle::MerkleTree;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building or sealing a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("a block must commit to at least one transaction")]
    Empty,

    #[error("nonce {nonce} does not satisfy difficulty {difficulty}")]
    InvalidProofOfWork { nonce: u64, difficulty: u32 },

    #[error("block is already finalized")]
    AlreadyFinalized,
}

/// One ledger segment.
///
/// A block is created unsealed (`current_hash` is `None`), sealed exactly
/// once by [`Block::try_finalize`], and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    previous_hash: Hash,
    nonce: u64,
    current_hash: Option<Hash>,
    merkle_root: Hash,
    tree: MerkleTree<Transaction>,
}

impl Block {
    /// Create an unsealed block over a snapshot of `transactions`.
    pub fn new(previous_hash: Hash, transactions: &[Transaction]) -> Result<Self, BlockError> {
        let tree = MerkleTree::build(transactions).map_err(|_| BlockError::Empty)?;

        Ok(Self {
            previous_hash,
            nonce: 0,
            current_hash: None,
            merkle_root: tree.root(),
            tree,
        })
    }

    pub fn previous_hash(&self) -> Hash {
        self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The sealed hash, or `None` before mining.
    pub fn hash(&self) -> Option<Hash> {
        self.current_hash
    }

    pub fn merkle_root(&self) -> Hash {
        self.merkle_root
    }

    pub fn tree(&self) -> &MerkleTree<Transaction> {
        &self.tree
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.tree.elements()
    }

    pub fn is_finalized(&self) -> bool {
        self.current_hash.is_some()
    }

    /// The fixed string the nonce search hashes against.
    pub fn miner_data(&self) -> String {
        format!("{}{}", self.previous_hash.to_hex(), self.merkle_root.to_hex())
    }

    /// Hash this block would have with the given nonce.
    pub fn compute_hash(&self, nonce: u64) -> Hash {
        hash_with_nonce(nonce, &self.miner_data())
    }

    /// Seal the block with `nonce` if it meets `difficulty`.
    ///
    /// On failure the block is left untouched.
    pub fn try_finalize(&mut self, nonce: u64, difficulty: u32) -> Result<(), BlockError> {
        if self.current_hash.is_some() {
            return Err(BlockError::AlreadyFinalized);
        }

        let candidate = self.compute_hash(nonce);
        if !candidate.meets_difficulty(difficulty) {
            return Err(BlockError::InvalidProofOfWork { nonce, difficulty });
        }

        self.nonce = nonce;
        self.current_hash = Some(candidate);
        Ok(())
    }

    /// True when the block is sealed and its hash matches its contents.
    pub fn is_valid(&self) -> bool {
        self.current_hash == Some(self.compute_hash(self.nonce))
    }

    /// Verify the merkle root matches the committed transactions.
    pub fn verify_merkle_root(&self) -> bool {
        self.tree.is_tree_valid() && self.tree.root() == self.merkle_root
    }

    /// Inclusion proof for `tx`; empty when the block does not contain it.
    pub fn proof(&self, tx: &Transaction) -> Vec<Hash> {
        self.tree.proof(tx)
    }

    pub fn is_proof_valid(&self, tx: &Transaction, proof: &[Hash]) -> bool {
        self.tree.is_proof_valid(tx, proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn sample_block(contents: &[&str]) -> Block {
        let keypair = Keypair::generate();
        let txs: Vec<Transaction> = contents
            .iter()
            .map(|c| Transaction::signed(*c, &keypair))
            .collect();
        Block::new(Hash::ZERO, &txs).unwrap()
    }

    fn first_valid_nonce(block: &Block, difficulty: u32) -> u64 {
        (0..).find(|n| block.compute_hash(*n).meets_difficulty(difficulty)).unwrap()
    }

    #[test]
    fn test_new_block_is_unsealed() {
        let block = sample_block(&["a", "b"]);

        assert_eq!(block.nonce(), 0);
        assert!(block.hash().is_none());
        assert!(!block.is_valid());
        assert_eq!(block.transactions().len(), 2);
        assert!(block.verify_merkle_root());
    }

    #[test]
    fn test_empty_block_rejected() {
        assert_eq!(Block::new(Hash::ZERO, &[]), Err(BlockError::Empty));
    }

    #[test]
    fn test_miner_data_order() {
        let block = sample_block(&["a"]);
        let expected = format!("{}{}", Hash::ZERO.to_hex(), block.merkle_root().to_hex());
        assert_eq!(block.miner_data(), expected);
    }

    #[test]
    fn test_difficulty_zero_accepts_any_nonce() {
        let mut block = sample_block(&["a"]);
        block.try_finalize(12345, 0).unwrap();

        assert_eq!(block.nonce(), 12345);
        assert_eq!(block.hash(), Some(block.compute_hash(12345)));
        assert!(block.is_valid());
    }

    #[test]
    fn test_finalize_with_mined_nonce() {
        let mut block = sample_block(&["a", "b", "c"]);
        let nonce = first_valid_nonce(&block, 2);

        block.try_finalize(nonce, 2).unwrap();
        assert!(block.is_valid());
        assert!(block.hash().unwrap().to_hex().starts_with("00"));
    }

    #[test]
    fn test_failed_finalize_leaves_block_unchanged() {
        let mut block = sample_block(&["a", "b"]);
        let before = block.clone();

        let bad = (0..)
            .filter(|n| !block.compute_hash(*n).meets_difficulty(2))
            .take(5)
            .collect::<Vec<u64>>();
        for nonce in bad {
            assert_eq!(
                block.try_finalize(nonce, 2),
                Err(BlockError::InvalidProofOfWork {
                    nonce,
                    difficulty: 2
                })
            );
        }
        assert_eq!(block, before);
    }

    #[test]
    fn test_finalize_only_once() {
        let mut block = sample_block(&["a"]);
        block.try_finalize(1, 0).unwrap();
        let sealed = block.hash();

        assert_eq!(block.try_finalize(2, 0), Err(BlockError::AlreadyFinalized));
        assert_eq!(block.hash(), sealed);
        assert_eq!(block.nonce(), 1);
    }

    #[test]
    fn test_block_proofs() {
        let block = sample_block(&["a", "b", "c", "d", "e"]);
        for tx in block.transactions() {
            let proof = block.proof(tx);
            assert!(block.is_proof_valid(tx, &proof));
        }
    }

    #[test]
    fn test_bincode_roundtrip_keeps_seal() {
        let mut block = sample_block(&["x", "y"]);
        block.try_finalize(7, 0).unwrap();

        let bytes = bincode::serialize(&block).unwrap();
        let decoded: Block = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, block);
        assert!(decoded.is_valid());
    }
}
