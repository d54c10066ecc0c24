//! Statistics tables and top-N reporting for the cache profiler.
//!
//! Two reports are rendered:
//! 1. A per-core table of accesses, misses, miss rates, and invalidations
//!    for L1-D, L1-I, and (when enabled) L2, with a `sum` row appended
//!    when more than one core is simulated.
//! 2. Three top-N sections listing the instructions with the most L1-D
//!    misses, L1-I misses, and L2 misses, `limit` entries each.

use std::fmt::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::registry::InsnRecord;
use super::CacheProfiler;

/// Counter triple read out of one cache under its lock.
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    accesses: u64,
    misses: u64,
    invals: u64,
}

impl Counters {
    fn add(&mut self, other: Counters) {
        self.accesses += other.accesses;
        self.misses += other.misses;
        self.invals += other.invals;
    }
}

/// Percentage of misses over accesses; zero when there were no accesses.
fn miss_rate(misses: u64, accesses: u64) -> f64 {
    if accesses == 0 {
        0.0
    } else {
        misses as f64 / accesses as f64 * 100.0
    }
}

/// Appends one data row: D group, I group, then the L2 group when the L2
/// saw any traffic.
fn append_stats_line(line: &mut String, d: Counters, i: Counters, l2: Counters) {
    let _ = write!(
        line,
        "{:<14} {:<12} {:>9.4}%  {:<14}  {:<14} {:<12} {:>9.4}%  {:<14}  ",
        d.accesses,
        d.misses,
        miss_rate(d.misses, d.accesses),
        d.invals,
        i.accesses,
        i.misses,
        miss_rate(i.misses, i.accesses),
        i.invals,
    );

    if l2.accesses != 0 && l2.misses != 0 {
        let _ = write!(
            line,
            "  {:<12} {:<11} {:>10.4}%  {:<14}",
            l2.accesses,
            l2.misses,
            miss_rate(l2.misses, l2.accesses),
            l2.invals,
        );
    }

    line.push('\n');
}

impl CacheProfiler {
    /// Reads one core's counters for a cache vector, resetting them when
    /// asked.
    fn read_counters(caches: &[std::sync::Mutex<crate::cache::Cache>], core: usize, reset: bool) -> Counters {
        let mut cache = caches[core].lock().unwrap();
        let c = Counters {
            accesses: cache.accesses,
            misses: cache.misses,
            invals: cache.invals,
        };
        if reset {
            cache.reset_counters();
        }
        c
    }

    /// Renders the per-core statistics table.
    ///
    /// # Arguments
    ///
    /// * `reset` - Clear the per-cache counters after reading them, so the
    ///   table can be produced once per instrumented program section.
    pub fn stats_report(&self, reset: bool) -> String {
        let mut rep = String::from(
            "core #, data accesses, data misses, dmiss rate, dcache inval, \
             insn accesses, insn misses, imiss rate, icache inval",
        );
        if self.l2_ucaches.is_some() {
            rep.push_str(", l2 accesses, l2 misses, l2 miss rate");
        }
        rep.push('\n');

        let mut d_sum = Counters::default();
        let mut i_sum = Counters::default();
        let mut l2_sum = Counters::default();

        for core in 0..self.cfg.cores {
            let d = Self::read_counters(&self.l1_dcaches, core, reset);
            let i = Self::read_counters(&self.l1_icaches, core, reset);
            let l2 = match &self.l2_ucaches {
                Some(caches) => Self::read_counters(caches, core, reset),
                None => Counters::default(),
            };

            let _ = write!(rep, "{:<8}", core);
            append_stats_line(&mut rep, d, i, l2);

            d_sum.add(d);
            i_sum.add(i);
            l2_sum.add(l2);
        }

        if self.cfg.cores > 1 {
            let _ = write!(rep, "{:<8}", "sum");
            append_stats_line(&mut rep, d_sum, i_sum, l2_sum);
        }

        rep.push('\n');
        rep
    }

    /// Renders the three top-N sections (data, fetch, and L2 misses).
    /// The L2 section is omitted when no L2 is simulated.
    pub fn top_insns_report(&self) -> String {
        let mut records = self.registry.snapshot();
        let mut rep = String::new();

        append_top_section(&mut rep, "address, data misses, instruction\n", &mut records, self.cfg.limit, |r| {
            r.l1_dmisses.load(Ordering::Relaxed)
        });

        rep.push('\n');
        append_top_section(&mut rep, "address, fetch misses, instruction\n", &mut records, self.cfg.limit, |r| {
            r.l1_imisses.load(Ordering::Relaxed)
        });

        if self.l2_ucaches.is_some() {
            rep.push('\n');
            append_top_section(&mut rep, "address, L2 misses, instruction\n", &mut records, self.cfg.limit, |r| {
                r.l2_misses.load(Ordering::Relaxed)
            });
        }

        rep
    }
}

/// Sorts `records` by `key` descending and appends the first `limit`
/// entries as `address[ (symbol)], count, disassembly` lines.
fn append_top_section(
    rep: &mut String,
    header: &str,
    records: &mut [Arc<InsnRecord>],
    limit: usize,
    key: fn(&InsnRecord) -> u64,
) {
    records.sort_by(|a, b| key(b).cmp(&key(a)));
    rep.push_str(header);

    for rec in records.iter().take(limit) {
        let _ = write!(rep, "0x{:x}", rec.addr);
        if let Some(symbol) = &rec.symbol {
            let _ = write!(rep, " ({})", symbol);
        }
        let _ = writeln!(rep, ", {}, {}", key(rec), rec.disas);
    }
}
