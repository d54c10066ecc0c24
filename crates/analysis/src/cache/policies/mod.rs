//! Cache eviction policies.
//!
//! Each policy keeps different bookkeeping per set, so the metadata is a
//! tagged variant rather than a set of optional fields:
//!
//! - `Lru`: priority array plus a generation counter.
//! - `Fifo`: queue of installed block indices.
//! - `Rand`: no per-set state; victims come from a shared xorshift PRNG.

/// First-In, First-Out eviction state.
pub mod fifo;

/// Least Recently Used eviction state.
pub mod lru;

/// Xorshift pseudo-random number generator for random eviction.
pub mod random;

pub use fifo::FifoState;
pub use lru::LruState;
pub use random::Lfsr;

use crate::config::EvictionPolicy;

/// Per-set eviction metadata, shaped by the configured policy.
#[derive(Debug)]
pub enum SetMeta {
    /// LRU bookkeeping.
    Lru(LruState),
    /// FIFO bookkeeping.
    Fifo(FifoState),
    /// Random eviction keeps no per-set state.
    Rand,
}

impl SetMeta {
    /// Creates the metadata variant for `policy` in a set of `assoc`
    /// blocks.
    pub fn new(policy: EvictionPolicy, assoc: usize) -> Self {
        match policy {
            EvictionPolicy::Lru => SetMeta::Lru(LruState::new(assoc)),
            EvictionPolicy::Fifo => SetMeta::Fifo(FifoState::new()),
            EvictionPolicy::Rand => SetMeta::Rand,
        }
    }

    /// Updates the metadata when block `blk` hits. Only LRU promotes on a
    /// hit.
    pub fn touch_hit(&mut self, blk: usize) {
        if let SetMeta::Lru(lru) = self {
            lru.touch(blk);
        }
    }

    /// Updates the metadata when a block is installed into `blk`.
    pub fn touch_install(&mut self, blk: usize) {
        match self {
            SetMeta::Lru(lru) => lru.touch(blk),
            SetMeta::Fifo(fifo) => fifo.push(blk),
            SetMeta::Rand => {}
        }
    }

    /// Selects the victim block for a conflict miss.
    ///
    /// # Arguments
    ///
    /// * `assoc` - Number of blocks in the set (random eviction range).
    /// * `rng` - The cache's PRNG, consulted only by random eviction.
    pub fn victim(&mut self, assoc: usize, rng: &mut Lfsr) -> usize {
        match self {
            SetMeta::Lru(lru) => lru.victim(),
            SetMeta::Fifo(fifo) => fifo.pop_oldest(),
            SetMeta::Rand => rng.next_below(assoc),
        }
    }
}
