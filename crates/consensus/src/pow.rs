//! Proof of Work nonce search.
//!
//! A search runs `workers` OS threads over one shared nonce counter. Each
//! worker takes the next counter value, hashes `nonce ++ data` and stops as
//! soon as any worker has published a winning nonce. The only shared state is
//! the atomic counter and a write-once result slot.

use powmesh_core::{hash_with_nonce, Block, BlockError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Instant;
use thiserror::Error;

/// Sanity ceiling for the nonce counter. Crossing it is logged, not enforced.
pub const MAX_NONCE: u64 = u32::MAX as u64;

/// A digest has 64 hex characters, so no higher difficulty can be met.
pub const MAX_DIFFICULTY: u32 = 64;

/// Errors that can occur during consensus operations.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("difficulty {difficulty} exceeds the maximum of {max}")]
    DifficultyTooHigh { difficulty: u32, max: u32 },

    #[error("block error: {0}")]
    Block(#[from] BlockError),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Proof of Work configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowConfig {
    /// Required number of leading zero hex characters.
    pub difficulty: u32,
    /// Number of worker threads per search.
    pub workers: usize,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty: 4,
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }
}

impl PowConfig {
    pub fn new(difficulty: u32, workers: usize) -> Self {
        Self {
            difficulty,
            workers,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ConsensusError::DifficultyTooHigh {
                difficulty: self.difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(())
    }
}

/// Stop flag shared between a running search and whoever may abort it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Find a nonce whose `hash(nonce ++ data)` has `difficulty` leading zeros.
///
/// Blocks until a worker succeeds. With one worker the nonces are tried in
/// order starting at 0.
///
/// # Panics
///
/// Panics if `difficulty` exceeds [`MAX_DIFFICULTY`], since such a search
/// could never finish.
pub fn find_nonce(data: &str, difficulty: u32, worker_count: usize) -> u64 {
    assert!(
        difficulty <= MAX_DIFFICULTY,
        "difficulty {difficulty} can never be met"
    );
    match search(data, difficulty, worker_count, None) {
        Some(nonce) => nonce,
        None => unreachable!("an uncancellable search only returns on success"),
    }
}

/// Like [`find_nonce`], but gives up and returns `None` once `cancel` fires.
pub fn find_nonce_cancellable(
    data: &str,
    difficulty: u32,
    worker_count: usize,
    cancel: &CancelToken,
) -> Option<u64> {
    if difficulty > MAX_DIFFICULTY {
        tracing::error!(difficulty, "refusing a search that can never finish");
        return None;
    }
    search(data, difficulty, worker_count, Some(cancel))
}

fn search(
    data: &str,
    difficulty: u32,
    worker_count: usize,
    cancel: Option<&CancelToken>,
) -> Option<u64> {
    let workers = worker_count.max(1);
    let counter = AtomicU64::new(0);
    let winner = OnceLock::new();
    let started = Instant::now();

    thread::scope(|scope| {
        for worker in 0..workers {
            let counter = &counter;
            let winner = &winner;
            scope.spawn(move || {
                while winner.get().is_none() && !cancel.is_some_and(CancelToken::is_cancelled) {
                    let nonce = counter.fetch_add(1, Ordering::Relaxed);
                    if nonce == MAX_NONCE {
                        tracing::error!(nonce, worker, "nonce search passed its sanity ceiling");
                    }
                    if hash_with_nonce(nonce, data).meets_difficulty(difficulty) {
                        if winner.set(nonce).is_ok() {
                            tracing::trace!(worker, nonce, "worker published nonce");
                        }
                        break;
                    }
                }
            });
        }
    });

    let found = winner.into_inner();
    match found {
        Some(nonce) => tracing::debug!(
            nonce,
            difficulty,
            workers,
            tried = counter.load(Ordering::Relaxed),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "nonce found"
        ),
        None => tracing::info!(difficulty, "nonce search cancelled"),
    }
    found
}

/// Seals blocks by proof of work.
#[derive(Debug, Clone)]
pub struct Miner {
    config: PowConfig,
}

impl Miner {
    /// Create a miner, rejecting difficulties that can never be met.
    pub fn new(config: PowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn find_nonce(&self, data: &str) -> u64 {
        find_nonce(data, self.config.difficulty, self.config.workers)
    }

    /// Mine and seal `block` in place.
    pub fn seal(&self, block: &mut Block) -> Result<()> {
        let nonce = self.find_nonce(&block.miner_data());
        block.try_finalize(nonce, self.config.difficulty)?;
        Ok(())
    }

    /// Mine and seal `block`, returning `false` if the search was cancelled.
    pub fn seal_cancellable(&self, block: &mut Block, cancel: &CancelToken) -> Result<bool> {
        let data = block.miner_data();
        let Some(nonce) =
            find_nonce_cancellable(&data, self.config.difficulty, self.config.workers, cancel)
        else {
            return Ok(false);
        };
        block.try_finalize(nonce, self.config.difficulty)?;
        Ok(true)
    }
}
