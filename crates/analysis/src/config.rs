//! Configuration for the cache-profiling analysis.
//!
//! Options arrive as a vector of `key=value` strings, the way an emulator
//! forwards plugin arguments. This module provides:
//! 1. **Defaults:** baseline cache geometry (L1-I, L1-D, L2) and report
//!    limits.
//! 2. **Structures:** per-cache geometry (`CacheParams`) and the parsed
//!    option set (`CacheSimConfig`).
//! 3. **Validation:** structural constraints every cache must satisfy
//!    before simulation starts.

use crate::error::ConfigError;
use crate::host::HostInfo;

/// Default configuration constants for the cache profiler.
mod defaults {
    /// Default cache block size in bytes, all levels.
    pub const BLKSIZE: usize = 64;

    /// Default L1 associativity (ways per set).
    pub const L1_ASSOC: usize = 8;

    /// Default L1 size: 64-byte blocks, 8 ways, 32 sets.
    pub const L1_CACHESIZE: usize = BLKSIZE * L1_ASSOC * 32;

    /// Default L1 low-tag width, assuming a 64-bit address.
    pub const L1_TAGLSIZE: u32 = 53;

    /// Default L2 associativity.
    pub const L2_ASSOC: usize = 16;

    /// Default L2 size: 64-byte blocks, 16 ways, 2048 sets.
    pub const L2_CACHESIZE: usize = BLKSIZE * L2_ASSOC * 2048;

    /// Default L2 low-tag width.
    pub const L2_TAGLSIZE: u32 = 45;

    /// Default number of entries per top-N report section.
    pub const LIMIT: usize = 32;
}

/// Eviction policy selecting the victim block on a conflict miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Least Recently Used: evict the block with the oldest access
    /// generation.
    #[default]
    Lru,
    /// First In First Out: evict the oldest installed block.
    Fifo,
    /// Random: evict a uniformly chosen block.
    Rand,
}

/// Geometry of a single cache level.
///
/// Block size, associativity, and total size must be powers of two, the
/// total size must be divisible by the set size, and the low-tag width
/// must leave room for the high tag in a 64-bit address. `validate`
/// checks all of this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheParams {
    /// Block (line) size in bytes.
    pub blksize: usize,
    /// Associativity: blocks per set.
    pub assoc: usize,
    /// Total cache size in bytes.
    pub cachesize: usize,
    /// Width of the per-block low tag in bits; the remaining tag bits form
    /// the per-set high tag.
    pub taglsize: u32,
}

impl CacheParams {
    /// Number of sets implied by the geometry.
    pub fn num_sets(&self) -> usize {
        self.cachesize / (self.blksize * self.assoc)
    }

    /// Checks the structural constraints for this geometry.
    ///
    /// # Arguments
    ///
    /// * `cache` - Label used in diagnostics (`"dcache"`, `"icache"`,
    ///   `"L2 cache"`).
    pub fn validate(&self, cache: &'static str) -> Result<(), ConfigError> {
        let bad = |reason: &'static str| ConfigError::BadGeometry { cache, reason };

        if !is_pow2(self.blksize) {
            return Err(bad("block size must be a power of two"));
        }
        if !is_pow2(self.assoc) {
            return Err(bad("associativity must be a power of two"));
        }
        if !is_pow2(self.cachesize) {
            return Err(bad("cache size must be a power of two"));
        }
        if self.cachesize % self.blksize != 0 {
            return Err(bad("cache size must be divisible by block size"));
        }
        if self.cachesize % (self.blksize * self.assoc) != 0 {
            return Err(bad(
                "cache size must be divisible by set size (assoc * block size)",
            ));
        }
        if self.taglsize >= u64::BITS {
            return Err(bad("low tag width must be below 64 bits"));
        }
        Ok(())
    }
}

/// Returns true when `n` is a non-zero power of two.
fn is_pow2(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Parsed option set for the cache profiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSimConfig {
    /// L1 instruction cache geometry.
    pub l1i: CacheParams,
    /// L1 data cache geometry.
    pub l1d: CacheParams,
    /// L2 unified cache geometry (used only when `use_l2` is set).
    pub l2: CacheParams,
    /// Whether per-core L2 caches are simulated.
    pub use_l2: bool,
    /// Number of simulated cores; vCPU indices are folded modulo this.
    pub cores: usize,
    /// Eviction policy shared by all caches.
    pub policy: EvictionPolicy,
    /// Whether instrumentation is gated by the start/stop magic opcodes.
    pub magic: bool,
    /// Entries per top-N report section.
    pub limit: usize,
}

impl CacheSimConfig {
    /// Returns the default configuration for the given host: one core per
    /// vCPU under system emulation, otherwise a single core.
    pub fn new(info: &HostInfo) -> Self {
        let l1 = CacheParams {
            blksize: defaults::BLKSIZE,
            assoc: defaults::L1_ASSOC,
            cachesize: defaults::L1_CACHESIZE,
            taglsize: defaults::L1_TAGLSIZE,
        };
        Self {
            l1i: l1,
            l1d: l1,
            l2: CacheParams {
                blksize: defaults::BLKSIZE,
                assoc: defaults::L2_ASSOC,
                cachesize: defaults::L2_CACHESIZE,
                taglsize: defaults::L2_TAGLSIZE,
            },
            use_l2: false,
            cores: if info.system_emulation {
                info.vcpus.max(1)
            } else {
                1
            },
            policy: EvictionPolicy::default(),
            magic: false,
            limit: defaults::LIMIT,
        }
    }

    /// Parses `key=value` arguments over the defaults and validates the
    /// resulting geometry.
    ///
    /// Any of the `l2*` geometry keys enables L2; the `l2` boolean can
    /// re-disable it afterwards (last write wins).
    ///
    /// # Arguments
    ///
    /// * `args` - Argument vector, one `key=value` pair per element.
    /// * `info` - Host facts used for the `cores` default.
    pub fn from_args(args: &[String], info: &HostInfo) -> Result<Self, ConfigError> {
        let mut cfg = Self::new(info);

        for opt in args {
            let Some((key, value)) = opt.split_once('=') else {
                return Err(ConfigError::UnknownOption(opt.clone()));
            };
            match key {
                "iblksize" => cfg.l1i.blksize = parse_int(key, value)?,
                "iassoc" => cfg.l1i.assoc = parse_int(key, value)?,
                "icachesize" => cfg.l1i.cachesize = parse_int(key, value)?,
                "itaglsize" => cfg.l1i.taglsize = parse_int(key, value)? as u32,
                "dblksize" => cfg.l1d.blksize = parse_int(key, value)?,
                "dassoc" => cfg.l1d.assoc = parse_int(key, value)?,
                "dcachesize" => cfg.l1d.cachesize = parse_int(key, value)?,
                "dtaglsize" => cfg.l1d.taglsize = parse_int(key, value)? as u32,
                "l2blksize" => {
                    cfg.use_l2 = true;
                    cfg.l2.blksize = parse_int(key, value)?;
                }
                "l2assoc" => {
                    cfg.use_l2 = true;
                    cfg.l2.assoc = parse_int(key, value)?;
                }
                "l2cachesize" => {
                    cfg.use_l2 = true;
                    cfg.l2.cachesize = parse_int(key, value)?;
                }
                "l2taglsize" => {
                    cfg.use_l2 = true;
                    cfg.l2.taglsize = parse_int(key, value)? as u32;
                }
                "l2" => cfg.use_l2 = parse_bool(key, value)?,
                "cores" => {
                    let cores = parse_int(key, value)?;
                    if cores == 0 {
                        return Err(ConfigError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        });
                    }
                    cfg.cores = cores;
                }
                "limit" => cfg.limit = parse_int(key, value)?,
                "replace" => {
                    cfg.policy = match value {
                        "lru" => EvictionPolicy::Lru,
                        "fifo" => EvictionPolicy::Fifo,
                        "rand" => EvictionPolicy::Rand,
                        _ => return Err(ConfigError::UnknownPolicy(value.to_string())),
                    }
                }
                "magic" => cfg.magic = parse_bool(key, value)?,
                _ => return Err(ConfigError::UnknownOption(opt.clone())),
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates the geometry of every enabled cache level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.l1d.validate("dcache")?;
        self.l1i.validate("icache")?;
        if self.use_l2 {
            self.l2.validate("L2 cache")?;
        }
        Ok(())
    }
}

/// Parses a decimal integer option value.
fn parse_int(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parses a boolean option value (`on`/`off`, `true`/`false`, `yes`/`no`).
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
