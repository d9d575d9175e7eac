//! Chain snapshot storage.
//!
//! The chain is persisted as one opaque snapshot, which is what gets loaded
//! back on startup. Blocks are also indexed by height and hash so that they
//! can be looked up without decoding the whole snapshot.

use crate::db::{BatchOp, Result, Storage};
use powmesh_core::{Block, Hash};

/// Keys for chain metadata.
const CHAIN_SNAPSHOT_KEY: &[u8] = b"chain:snapshot";
const CHAIN_HEIGHT_KEY: &[u8] = b"chain:height";

/// Manages the stored chain snapshot and block indexes.
#[derive(Clone)]
pub struct ChainStore {
    storage: Storage,
}

impl ChainStore {
    /// Create a new ChainStore wrapping the given storage.
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Record `block` as the new tip at `height`, together with the snapshot
    /// of the chain that now ends in it.
    ///
    /// The snapshot, the stored height and both index entries of the block
    /// are written in a single batch.
    pub fn append_block(&self, snapshot: &[u8], height: u64, block: &Block) -> Result<()> {
        let mut ops = vec![
            BatchOp::Insert {
                key: CHAIN_SNAPSHOT_KEY.to_vec(),
                value: snapshot.to_vec(),
            },
            BatchOp::insert(CHAIN_HEIGHT_KEY.to_vec(), &(height + 1))?,
            BatchOp::insert(Storage::block_height_key(height), block)?,
        ];
        if let Some(hash) = block.hash() {
            ops.push(BatchOp::insert(Storage::block_hash_key(&hash), &height)?);
        }

        self.storage.batch(ops)?;
        self.storage.flush()?;

        tracing::debug!(height, "chain snapshot saved");
        Ok(())
    }

    /// The last saved snapshot, if any.
    pub fn load_snapshot(&self) -> Result<Option<Vec<u8>>> {
        self.storage.get_raw(CHAIN_SNAPSHOT_KEY)
    }

    /// Number of blocks in the stored chain (0 when nothing is stored).
    pub fn get_height(&self) -> Result<u64> {
        Ok(self.storage.get::<_, u64>(CHAIN_HEIGHT_KEY)?.unwrap_or(0))
    }

    // =========================================================================
    // Block Lookups
    // =========================================================================

    /// Get a block by its position in the chain.
    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        self.storage.get(Storage::block_height_key(height))
    }

    /// Get a block and its height by the block's sealed hash.
    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Option<(u64, Block)>> {
        let height: Option<u64> = self.storage.get(Storage::block_hash_key(hash))?;
        match height {
            Some(h) => Ok(self.get_block_by_height(h)?.map(|block| (h, block))),
            None => Ok(None),
        }
    }

    /// Get the last N blocks with their heights (most recent first).
    pub fn get_recent_blocks(&self, count: u64) -> Result<Vec<(u64, Block)>> {
        let length = self.get_height()?;
        let from = length.saturating_sub(count);

        let mut blocks = Vec::new();
        for height in (from..length).rev() {
            if let Some(block) = self.get_block_by_height(height)? {
                blocks.push((height, block));
            }
        }
        Ok(blocks)
    }
}
