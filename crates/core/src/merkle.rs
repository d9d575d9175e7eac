//! Merkle tree over an ordered list of payloads.
//!
//! Leaves are the digest of each payload's canonical string form (its
//! `Display` output). Parents hash the hex text of their two children; a node
//! left without a sibling is hashed alone and carried up.

use crate::hash::{hash, hash_pair, Hash};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while building or restoring a tree.
#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("cannot build a merkle tree from zero payloads")]
    Empty,

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("malformed tree snapshot")]
    Malformed,
}

pub type Result<T> = std::result::Result<T, MerkleError>;

/// Digest of a payload's canonical string form.
pub fn leaf_hash<T: fmt::Display>(payload: &T) -> Hash {
    hash(payload.to_string().as_bytes())
}

fn lone_hash(node: &Hash) -> Hash {
    hash(node.to_hex().as_bytes())
}

fn next_level(current: &[Hash]) -> Vec<Hash> {
    current
        .chunks(2)
        .map(|chunk| match chunk {
            [left, right] => hash_pair(left, right),
            [lone] => lone_hash(lone),
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

/// A merkle tree for inclusion proofs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleTree<T> {
    /// All nodes in the tree, level by level (leaves first).
    levels: Vec<Vec<Hash>>,
    /// The payloads the leaves commit to, in order.
    elements: Vec<T>,
}

impl<T: fmt::Display + Clone> MerkleTree<T> {
    /// Build a tree from a snapshot of the given payloads.
    pub fn build(payloads: &[T]) -> Result<Self> {
        if payloads.is_empty() {
            return Err(MerkleError::Empty);
        }

        let mut levels = vec![payloads.iter().map(leaf_hash).collect::<Vec<_>>()];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next = next_level(current);
            levels.push(next);
        }

        Ok(Self {
            levels,
            elements: payloads.to_vec(),
        })
    }

    /// Get the root of the merkle tree.
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Hash::ZERO)
    }

    /// Get the number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(|l| l.len()).unwrap_or(0)
    }

    /// Number of folding steps between a leaf and the root.
    pub fn height(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    /// Collect the sibling digests needed to rebuild the root from `payload`.
    ///
    /// The first leaf with a matching hash is used, so duplicated payloads
    /// always prove against their first position. Levels where the node has
    /// no sibling contribute nothing. Returns an empty proof when the payload
    /// is not in the tree.
    pub fn proof(&self, payload: &T) -> Vec<Hash> {
        let target = leaf_hash(payload);
        let Some(mut idx) = self
            .levels
            .first()
            .and_then(|leaves| leaves.iter().position(|leaf| *leaf == target))
        else {
            return Vec::new();
        };

        let mut siblings = Vec::new();
        for level in &self.levels[..self.height()] {
            let sibling_idx = idx ^ 1;
            if let Some(sibling) = level.get(sibling_idx) {
                siblings.push(*sibling);
            }
            idx /= 2;
        }
        siblings
    }

    /// Check a proof produced by [`MerkleTree::proof`] against this tree's root.
    ///
    /// Proofs carry no left/right flags, so every step tries the sibling on
    /// both sides, and levels without a sibling hash the node alone.
    pub fn is_proof_valid(&self, payload: &T, proof: &[Hash]) -> bool {
        if proof.is_empty() && self.leaf_count() > 1 {
            return false;
        }
        fold_proof(leaf_hash(payload), proof, self.height(), &self.root())
    }

    /// Recompute every leaf and parent and compare against the stored levels.
    pub fn is_tree_valid(&self) -> bool {
        let Some(leaves) = self.levels.first() else {
            return false;
        };
        if leaves.len() != self.elements.len()
            || self.elements.iter().zip(leaves).any(|(e, l)| leaf_hash(e) != *l)
        {
            return false;
        }

        let parents_match = self
            .levels
            .windows(2)
            .all(|pair| next_level(&pair[0]) == pair[1]);

        parents_match && self.levels.last().map(|l| l.len()) == Some(1)
    }
}

impl<T> MerkleTree<T>
where
    T: fmt::Display + Clone + Serialize + DeserializeOwned,
{
    /// Serialize the whole tree.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Restore a tree from [`MerkleTree::snapshot`] output.
    pub fn restore(bytes: &[u8]) -> Result<Self> {
        let tree: Self = bincode::deserialize(bytes)?;
        if !tree.is_tree_valid() {
            return Err(MerkleError::Malformed);
        }
        Ok(tree)
    }
}

fn fold_proof(current: Hash, proof: &[Hash], remaining: usize, root: &Hash) -> bool {
    if remaining == 0 {
        return proof.is_empty() && current == *root;
    }
    if proof.len() > remaining {
        return false;
    }

    if let Some((sibling, rest)) = proof.split_first() {
        if fold_proof(hash_pair(&current, sibling), rest, remaining - 1, root)
            || fold_proof(hash_pair(sibling, &current), rest, remaining - 1, root)
        {
            return true;
        }
    }

    proof.len() < remaining && fold_proof(lone_hash(&current), proof, remaining - 1, root)
}
