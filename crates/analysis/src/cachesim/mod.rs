//! Cache-profiling analysis.
//!
//! Simulates a per-core cache hierarchy (L1-I, L1-D, optional L2) over the
//! host's instruction and memory-access stream:
//! 1. **Translation:** each instruction is interned into the registry and
//!    subscribed for execution and memory callbacks.
//! 2. **Execution:** an instruction fetch probes the executing core's
//!    L1-I; a data access probes its L1-D; either consults the core's L2
//!    on a miss. Misses are attributed to the instruction's record.
//! 3. **Reporting:** per-core statistics and a top-N worst-offender list
//!    at exit, or at every stop marker.
//!
//! With `magic=on`, instrumentation only runs between the start marker
//! (`rdtime zero`) and the stop marker (`rdcycle zero`); the stop marker
//! additionally dumps and resets the per-core statistics.
//!
//! Locking: every cache has its own mutex, and a callback holds at most
//! one of them at a time (the L1 lock is released before the L2 lock is
//! taken). Per-instruction counters are atomics and take no lock.

/// Interned per-instruction miss records.
pub mod registry;

/// Statistics tables and top-N reporting.
pub mod report;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::Cache;
use crate::config::CacheSimConfig;
use crate::error::ConfigError;
use crate::host::{Analysis, HookId, HostInfo, InsnHooks, MemAccess, TranslationBlock};
use registry::{InsnRecord, InsnRegistry};

/// Opcode of the instrumentation start marker (`rdtime zero`).
pub const MAGIC_OPCODE_START: u32 = 0xc010_2073;

/// Opcode of the instrumentation stop marker (`rdcycle zero`).
pub const MAGIC_OPCODE_STOP: u32 = 0xc000_2073;

/// Hook handle reserved for the start marker.
const HOOK_START: HookId = u64::MAX;

/// Hook handle reserved for the stop marker.
const HOOK_STOP: HookId = u64::MAX - 1;

/// The cache-profiling analysis core.
pub struct CacheProfiler {
    cfg: CacheSimConfig,
    /// Full-system emulation: fetches are keyed by host address.
    sys: bool,
    l1_dcaches: Vec<Mutex<Cache>>,
    l1_icaches: Vec<Mutex<Cache>>,
    l2_ucaches: Option<Vec<Mutex<Cache>>>,
    registry: InsnRegistry,
    /// Instrumentation window flag; only consulted when `cfg.magic`.
    /// Races merely delay the window edge by a few instructions.
    window_open: AtomicBool,
}

impl CacheProfiler {
    /// Builds the per-core hierarchy for a validated configuration.
    ///
    /// # Arguments
    ///
    /// * `cfg` - Parsed options; geometry is re-validated here so direct
    ///   construction cannot bypass the checks.
    /// * `info` - Host facts (emulation mode).
    pub fn new(cfg: CacheSimConfig, info: &HostInfo) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let caches = |params| -> Vec<Mutex<Cache>> {
            (0..cfg.cores)
                .map(|_| Mutex::new(Cache::new(params, cfg.policy)))
                .collect()
        };

        Ok(Self {
            sys: info.system_emulation,
            l1_dcaches: caches(&cfg.l1d),
            l1_icaches: caches(&cfg.l1i),
            l2_ucaches: cfg.use_l2.then(|| caches(&cfg.l2)),
            registry: InsnRegistry::new(),
            window_open: AtomicBool::new(false),
            cfg,
        })
    }

    /// Access to the interned records, mainly for inspection in tests.
    pub fn registry(&self) -> &InsnRegistry {
        &self.registry
    }

    /// True when execution callbacks should be processed.
    fn enabled(&self) -> bool {
        !self.cfg.magic || self.window_open.load(Ordering::Relaxed)
    }

    /// Probes the core's L2 after an L1 miss, attributing the outcome to
    /// `rec`. The L1 lock must already be released.
    fn access_l2(&self, core: usize, addr: u64, rec: &Arc<InsnRecord>) {
        let Some(l2) = &self.l2_ucaches else {
            return;
        };
        let result = l2[core].lock().unwrap().access(addr);
        if result.is_miss() {
            rec.l2_misses.fetch_add(1, Ordering::Relaxed);
            if result.is_inval() {
                rec.l2_invals.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Prints the per-core statistics table, optionally resetting the
    /// per-cache counters afterwards.
    pub fn dump_stats(&self, reset: bool) {
        print!("{}", self.stats_report(reset));
    }
}

impl Analysis for CacheProfiler {
    fn on_translation(&self, tb: &TranslationBlock) -> Vec<InsnHooks> {
        let mut hooks = Vec::with_capacity(tb.insns.len());

        for insn in &tb.insns {
            if self.cfg.magic {
                match insn.opcode_u32() {
                    Some(MAGIC_OPCODE_START) => {
                        // Open the window at translation time too, so the
                        // rest of this block gets subscribed.
                        self.window_open.store(true, Ordering::Relaxed);
                        hooks.push(InsnHooks {
                            exec: Some(HOOK_START),
                            mem: None,
                        });
                        continue;
                    }
                    Some(MAGIC_OPCODE_STOP) => {
                        self.window_open.store(false, Ordering::Relaxed);
                        hooks.push(InsnHooks {
                            exec: Some(HOOK_STOP),
                            mem: None,
                        });
                        return hooks;
                    }
                    _ => {}
                }
                if !self.window_open.load(Ordering::Relaxed) {
                    return hooks;
                }
            }

            // Assume a VIPT cache under full-system emulation.
            let effective_addr = if self.sys { insn.haddr } else { insn.vaddr };
            let idx = self
                .registry
                .intern(effective_addr, &insn.disas, insn.symbol.as_deref());
            hooks.push(InsnHooks {
                exec: Some(idx as HookId),
                mem: Some(idx as HookId),
            });
        }

        hooks
    }

    fn on_insn_exec(&self, vcpu_index: usize, hook: HookId) {
        match hook {
            HOOK_START => {
                self.window_open.store(true, Ordering::Relaxed);
                return;
            }
            HOOK_STOP => {
                self.window_open.store(false, Ordering::Relaxed);
                self.dump_stats(true);
                return;
            }
            _ => {}
        }
        if !self.enabled() {
            return;
        }
        let Some(rec) = self.registry.get(hook as usize) else {
            return;
        };

        let core = vcpu_index % self.cfg.cores;
        let result = self.l1_icaches[core].lock().unwrap().access(rec.addr);
        if result.is_miss() {
            rec.l1_imisses.fetch_add(1, Ordering::Relaxed);
            if result.is_inval() {
                rec.l1_iinvals.fetch_add(1, Ordering::Relaxed);
            }
            self.access_l2(core, rec.addr, &rec);
        }
    }

    fn on_mem_access(&self, vcpu_index: usize, hook: HookId, access: &MemAccess) {
        // Needed if the block was translated before the window opened.
        if !self.enabled() {
            return;
        }
        if let Some(hw) = access.hwaddr {
            if hw.is_io {
                return;
            }
        }
        let effective_addr = access.hwaddr.map_or(access.vaddr, |hw| hw.phys_addr);

        let Some(rec) = self.registry.get(hook as usize) else {
            return;
        };

        let core = vcpu_index % self.cfg.cores;
        let result = self.l1_dcaches[core].lock().unwrap().access(effective_addr);
        if result.is_miss() {
            rec.l1_dmisses.fetch_add(1, Ordering::Relaxed);
            if result.is_inval() {
                rec.l1_dinvals.fetch_add(1, Ordering::Relaxed);
            }
            self.access_l2(core, effective_addr, &rec);
        }
    }

    fn on_exit(&self) {
        self.dump_stats(false);
        print!("{}", self.top_insns_report());
    }
}
