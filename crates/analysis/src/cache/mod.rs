//! Split-tag set-associative cache engine.
//!
//! This module implements a non-functional cache model: no data is stored,
//! a block is identified purely by its tag. The conventional tag is split
//! in two:
//!
//! - a **low tag**, stored per block, `taglsize` bits wide;
//! - a **high tag**, the remaining upper bits, stored once per set.
//!
//! All valid blocks of a set share the set's high tag. When an access
//! carries a different high tag, every block in the set is invalidated
//! before the new block is installed. With `taglsize` wide enough to cover
//! the whole tag, the scheme degenerates to a conventional cache.
//!
//! The address is decomposed, from low to high bits, into block offset,
//! set index, low tag, and high tag; the four masks partition the address
//! with no overlap and no gaps.

/// Eviction policies and their per-set metadata.
pub mod policies;

use self::policies::{Lfsr, SetMeta};
use crate::config::{CacheParams, EvictionPolicy};

/// Outcome of a cache access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    /// The block was present.
    Hit,
    /// The block was absent; it has been installed.
    Miss,
    /// The block was absent and its high tag differed from the set's, so
    /// the whole set was invalidated before installation.
    MissInval,
}

impl AccessResult {
    /// True for both miss flavors.
    pub fn is_miss(self) -> bool {
        !matches!(self, AccessResult::Hit)
    }

    /// True only for a miss that invalidated the set.
    pub fn is_inval(self) -> bool {
        matches!(self, AccessResult::MissInval)
    }
}

/// One cache block: a low tag and a valid bit. The low tag content is
/// meaningless while the block is invalid.
#[derive(Debug, Clone, Copy, Default)]
struct CacheBlock {
    tagl: u64,
    valid: bool,
}

/// One cache set: the shared high tag, `assoc` blocks, and the eviction
/// metadata for the configured policy.
#[derive(Debug)]
struct CacheSet {
    /// High tag shared by all valid blocks. `None` until the first
    /// installation into this set.
    tagh: Option<u64>,
    blocks: Vec<CacheBlock>,
    meta: SetMeta,
}

impl CacheSet {
    fn any_valid(&self) -> bool {
        self.blocks.iter().any(|b| b.valid)
    }
}

/// A single split-tag cache instance.
///
/// Geometry is fixed at construction; `access` simulates one lookup and
/// updates the hit/miss/invalidation counters. Callers are expected to
/// validate the geometry beforehand via [`CacheParams::validate`].
#[derive(Debug)]
pub struct Cache {
    sets: Vec<CacheSet>,
    assoc: usize,
    blksize_shift: u32,
    set_mask: u64,
    tagh_mask: u64,
    tagl_mask: u64,
    rng: Lfsr,
    /// Total lookups performed.
    pub accesses: u64,
    /// Lookups that did not hit.
    pub misses: u64,
    /// Misses that invalidated the whole set (high-tag change).
    pub invals: u64,
}

impl Cache {
    /// Creates a cache with the given geometry and eviction policy.
    ///
    /// # Arguments
    ///
    /// * `params` - Validated cache geometry.
    /// * `policy` - Eviction policy; decides the per-set metadata shape.
    pub fn new(params: &CacheParams, policy: EvictionPolicy) -> Self {
        let num_sets = params.num_sets();
        let blksize_shift = params.blksize.trailing_zeros();
        let set_shift = num_sets.trailing_zeros();

        let blk_mask = params.blksize as u64 - 1;
        let set_mask = ((num_sets as u64) - 1) << blksize_shift;
        let tag_mask = !(set_mask | blk_mask);

        // The low-tag window sits immediately above the set bits; whatever
        // part of the tag it does not cover becomes the per-set high tag.
        let tag_shift = set_shift + blksize_shift;
        let low_window = if params.taglsize == 0 {
            0
        } else {
            ((1u64 << params.taglsize) - 1) << tag_shift
        };

        let sets = (0..num_sets)
            .map(|_| CacheSet {
                tagh: None,
                blocks: vec![CacheBlock::default(); params.assoc],
                meta: SetMeta::new(policy, params.assoc),
            })
            .collect();

        Self {
            sets,
            assoc: params.assoc,
            blksize_shift,
            set_mask,
            tagh_mask: tag_mask & !low_window,
            tagl_mask: tag_mask & low_window,
            rng: Lfsr::default(),
            accesses: 0,
            misses: 0,
            invals: 0,
        }
    }

    /// High-tag portion of an address.
    #[inline]
    fn extract_tagh(&self, addr: u64) -> u64 {
        addr & self.tagh_mask
    }

    /// Low-tag portion of an address.
    #[inline]
    fn extract_tagl(&self, addr: u64) -> u64 {
        addr & self.tagl_mask
    }

    /// Set index of an address.
    #[inline]
    fn extract_set(&self, addr: u64) -> usize {
        ((addr & self.set_mask) >> self.blksize_shift) as usize
    }

    /// Returns the index of the block holding `addr`, if present.
    fn lookup(&self, set: usize, tagh: u64, tagl: u64) -> Option<usize> {
        if self.sets[set].tagh != Some(tagh) {
            return None;
        }
        self.sets[set]
            .blocks
            .iter()
            .position(|b| b.valid && b.tagl == tagl)
    }

    /// Returns whether `addr` is currently cached, without touching any
    /// state.
    pub fn contains(&self, addr: u64) -> bool {
        self.lookup(
            self.extract_set(addr),
            self.extract_tagh(addr),
            self.extract_tagl(addr),
        )
        .is_some()
    }

    /// Simulates one access to `addr` and updates the counters.
    ///
    /// On a miss the block is installed for the next access: an invalid
    /// block is preferred (lowest index first); otherwise the policy picks
    /// the victim. A high-tag mismatch against a set holding valid blocks
    /// invalidates the whole set first and is reported as
    /// [`AccessResult::MissInval`].
    pub fn access(&mut self, addr: u64) -> AccessResult {
        self.accesses += 1;

        let tagh = self.extract_tagh(addr);
        let tagl = self.extract_tagl(addr);
        let set = self.extract_set(addr);

        if let Some(blk) = self.lookup(set, tagh, tagl) {
            self.sets[set].meta.touch_hit(blk);
            return AccessResult::Hit;
        }

        self.misses += 1;

        let assoc = self.assoc;
        let rng = &mut self.rng;
        let s = &mut self.sets[set];

        let mut inval = false;
        if s.tagh != Some(tagh) {
            if s.any_valid() {
                for b in &mut s.blocks {
                    b.valid = false;
                }
                inval = true;
            }
            // The incoming block is installed under the new high tag.
            s.tagh = Some(tagh);
        }

        let victim = match s.blocks.iter().position(|b| !b.valid) {
            Some(free) => free,
            None => s.meta.victim(assoc, rng),
        };

        s.meta.touch_install(victim);
        s.blocks[victim] = CacheBlock { tagl, valid: true };

        if inval {
            self.invals += 1;
            AccessResult::MissInval
        } else {
            AccessResult::Miss
        }
    }

    /// Resets the access, miss, and invalidation counters, leaving cache
    /// contents intact.
    pub fn reset_counters(&mut self) {
        self.accesses = 0;
        self.misses = 0;
        self.invals = 0;
    }

    /// Number of valid blocks in the set holding `addr`. Test hook for
    /// checking set-level invariants.
    pub fn valid_blocks_in_set_of(&self, addr: u64) -> usize {
        self.sets[self.extract_set(addr)]
            .blocks
            .iter()
            .filter(|b| b.valid)
            .count()
    }
}
