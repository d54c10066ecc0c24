//! Interned per-instruction miss records.
//!
//! Instructions may be translated many times; each effective address gets
//! exactly one record, created on first translation and reused afterwards.
//! The registry hands out stable indices as hook handles, so execution
//! callbacks never depend on host-side pointers. Records are shared via
//! `Arc` and their counters are atomics, updated lock-free from execution
//! callbacks; the registry's write lock is taken at translation time only.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, RwLock};

/// Per-instruction miss and invalidation counters, keyed by effective
/// address.
#[derive(Debug)]
pub struct InsnRecord {
    /// Textual disassembly, as provided by the host.
    pub disas: String,
    /// Symbol covering the instruction, when known.
    pub symbol: Option<String>,
    /// Effective address the record is interned under.
    pub addr: u64,
    /// L1 data-cache misses attributed to this instruction.
    pub l1_dmisses: AtomicU64,
    /// L1 instruction-cache misses.
    pub l1_imisses: AtomicU64,
    /// L1 data-cache set invalidations.
    pub l1_dinvals: AtomicU64,
    /// L1 instruction-cache set invalidations.
    pub l1_iinvals: AtomicU64,
    /// L2 misses.
    pub l2_misses: AtomicU64,
    /// L2 set invalidations.
    pub l2_invals: AtomicU64,
}

impl InsnRecord {
    fn new(addr: u64, disas: &str, symbol: Option<&str>) -> Self {
        Self {
            disas: disas.to_string(),
            symbol: symbol.map(str::to_string),
            addr,
            l1_dmisses: AtomicU64::new(0),
            l1_imisses: AtomicU64::new(0),
            l1_dinvals: AtomicU64::new(0),
            l1_iinvals: AtomicU64::new(0),
            l2_misses: AtomicU64::new(0),
            l2_invals: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_addr: HashMap<u64, usize>,
    records: Vec<Arc<InsnRecord>>,
}

/// Registry interning one [`InsnRecord`] per effective address.
#[derive(Debug, Default)]
pub struct InsnRegistry {
    inner: RwLock<RegistryInner>,
}

impl InsnRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of the record for `addr`, creating it on first
    /// sight. Re-translations of the same address reuse the existing
    /// record.
    pub fn intern(&self, addr: u64, disas: &str, symbol: Option<&str>) -> usize {
        let mut inner = self.inner.write().unwrap();
        if let Some(&idx) = inner.by_addr.get(&addr) {
            return idx;
        }
        let idx = inner.records.len();
        inner
            .records
            .push(Arc::new(InsnRecord::new(addr, disas, symbol)));
        inner.by_addr.insert(addr, idx);
        idx
    }

    /// Returns the record at `idx`, if any.
    pub fn get(&self, idx: usize) -> Option<Arc<InsnRecord>> {
        self.inner.read().unwrap().records.get(idx).cloned()
    }

    /// Returns a snapshot of all records, in interning order.
    pub fn snapshot(&self) -> Vec<Arc<InsnRecord>> {
        self.inner.read().unwrap().records.clone()
    }

    /// Number of interned records.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().records.len()
    }

    /// True when no record has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
