//! Ledger orchestration.
//!
//! The ledger brings together the chain, the pending set, the miner and
//! (optionally) persistent storage.

use crate::chain::{Chain, ChainError};
use crate::mempool::PendingSet;
use parking_lot::Mutex;
use powmesh_consensus::{CancelToken, ConsensusError, Miner, PowConfig};
use powmesh_core::{Block, BlockError, Hash, Transaction};
use powmesh_storage::{ChainStore, StorageError};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("block error: {0}")]
    Block(#[from] BlockError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The local ledger: a chain, its pending set and the miner that extends it.
pub struct Ledger {
    chain: Mutex<Chain>,
    pending: PendingSet,
    miner: Miner,
    store: Option<ChainStore>,
    /// Serializes mining runs so that two searches never race for one parent.
    mining: Mutex<()>,
    active: Mutex<Option<CancelToken>>,
}

impl Ledger {
    /// Create an in-memory ledger with an empty chain.
    pub fn new(config: PowConfig) -> Result<Self> {
        Ok(Self::with_chain(Miner::new(config)?, Chain::new(), None))
    }

    /// Open a ledger backed by `store`, restoring the last saved chain.
    ///
    /// The restored chain is replayed for link, hash and merkle consistency.
    /// Proof of work is not re-checked against the current difficulty, since
    /// blocks may have been mined under an earlier setting.
    pub fn open(config: PowConfig, store: ChainStore) -> Result<Self> {
        let miner = Miner::new(config)?;

        let chain = match store.load_snapshot()? {
            Some(bytes) => {
                let chain = Chain::from_snapshot(&bytes)?;
                chain.verify(0)?;
                tracing::info!(height = chain.len(), "restored chain from storage");
                chain
            }
            None => Chain::new(),
        };

        Ok(Self::with_chain(miner, chain, Some(store)))
    }

    fn with_chain(miner: Miner, chain: Chain, store: Option<ChainStore>) -> Self {
        Self {
            chain: Mutex::new(chain),
            pending: PendingSet::new(),
            miner,
            store,
            mining: Mutex::new(()),
            active: Mutex::new(None),
        }
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub fn difficulty(&self) -> u32 {
        self.miner.difficulty()
    }

    /// A copy of the current chain.
    pub fn chain(&self) -> Chain {
        self.chain.lock().clone()
    }

    pub fn height(&self) -> usize {
        self.chain.lock().len()
    }

    pub fn last_block_hash(&self) -> Hash {
        self.chain.lock().last_block_hash()
    }

    /// Replay the whole chain at the configured difficulty.
    pub fn verify(&self) -> Result<()> {
        self.chain.lock().verify(self.difficulty())?;
        Ok(())
    }

    /// Append a sealed block and persist the new chain.
    ///
    /// If persisting fails the in-memory chain keeps its previous state.
    pub fn append(&self, block: Block) -> Result<()> {
        let mut chain = self.chain.lock();

        chain.append(block)?;
        if let Err(err) = self.persist(&chain) {
            chain.pop();
            return Err(err);
        }

        tracing::info!(
            height = chain.len(),
            hash = %chain.last_block_hash(),
            "block appended"
        );
        Ok(())
    }

    fn persist(&self, chain: &Chain) -> Result<()> {
        let (Some(store), Some(tip)) = (&self.store, chain.last()) else {
            return Ok(());
        };
        let snapshot = chain.snapshot()?;
        store.append_block(&snapshot, (chain.len() - 1) as u64, tip)?;
        Ok(())
    }

    /// Look up a block and its height by sealed hash.
    pub fn block_by_hash(&self, hash: &Hash) -> Result<Option<(usize, Block)>> {
        if let Some(store) = &self.store {
            let found = store.get_block_by_hash(hash)?;
            return Ok(found.map(|(height, block)| (height as usize, block)));
        }
        let chain = self.chain.lock();
        Ok(chain
            .blocks()
            .iter()
            .position(|block| block.hash() == Some(*hash))
            .and_then(|height| chain.get(height).map(|block| (height, block.clone()))))
    }

    /// The last `count` blocks with their heights, most recent first.
    pub fn recent_blocks(&self, count: usize) -> Result<Vec<(usize, Block)>> {
        if let Some(store) = &self.store {
            let recent = store.get_recent_blocks(count as u64)?;
            return Ok(recent
                .into_iter()
                .map(|(height, block)| (height as usize, block))
                .collect());
        }
        let chain = self.chain.lock();
        Ok(chain
            .blocks()
            .iter()
            .enumerate()
            .rev()
            .take(count)
            .map(|(height, block)| (height, block.clone()))
            .collect())
    }

    /// Package the pending set into a block, mine it and append it.
    ///
    /// Returns `None` when nothing is pending or the search was cancelled.
    /// Mined transactions are removed from the pending set; anything that
    /// arrived during the search stays pending for the next run.
    pub fn mine_pending(&self) -> Result<Option<Block>> {
        let _mining = self.mining.lock();

        let transactions = self.pending.snapshot();
        if transactions.is_empty() {
            tracing::debug!("nothing pending to mine");
            return Ok(None);
        }

        let mut block = Block::new(self.last_block_hash(), &transactions)?;
        tracing::info!(
            transactions = transactions.len(),
            difficulty = self.difficulty(),
            "mining block"
        );

        let cancel = CancelToken::new();
        *self.active.lock() = Some(cancel.clone());
        let sealed = self.miner.seal_cancellable(&mut block, &cancel);
        self.active.lock().take();

        if !sealed? {
            return Ok(None);
        }

        self.append(block.clone())?;
        self.pending.remove_all(block.transactions());
        Ok(Some(block))
    }

    /// Abort the mining run in progress, if any.
    pub fn cancel_mining(&self) {
        if let Some(cancel) = self.active.lock().as_ref() {
            cancel.cancel();
            tracing::info!("mining cancelled");
        }
    }

    pub fn is_mining(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Add a transaction to the pending set, returning `false` if it was
    /// already there.
    pub fn submit(&self, tx: Transaction) -> bool {
        self.pending.insert(tx)
    }

    pub fn stats(&self) -> LedgerStats {
        let chain = self.chain.lock();
        LedgerStats {
            height: chain.len(),
            last_block_hash: chain.last_block_hash(),
            pending_transactions: self.pending.len(),
            difficulty: self.difficulty(),
        }
    }
}

/// Ledger statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStats {
    /// Number of blocks in the chain.
    pub height: usize,
    /// Hash of the tip, zero for an empty chain.
    pub last_block_hash: Hash,
    /// Number of pending transactions.
    pub pending_transactions: usize,
    /// Difficulty new blocks are mined at.
    pub difficulty: u32,
}
