//! Bounded execution history and the backward dependency walk.
//!
//! The history holds classified instructions in execution order, newest
//! last. A walk starts from a register index and searches newer-to-older
//! for the instruction that last wrote it; the producer's own sources are
//! then chased recursively from its position, so every step moves strictly
//! deeper into the past and the walk terminates.
//!
//! A chain branch ends at an instruction that synthesizes its value from
//! an immediate (`lui`/`auipc`/`jal`, address source `rd`), or at the end
//! of recorded history.

use std::sync::Arc;

use super::decode::{AddrSource, InsnDecode};

/// Maximum retained entries per history; the oldest half is dropped when
/// the cap is reached. Chains older than the cap terminate at history end.
pub const HISTORY_CAP: usize = 65_536;

/// Execution history for one virtual CPU.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<Arc<InsnDecode>>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends one executed instruction, pruning the oldest half of the
    /// history first when the cap is reached.
    pub fn record(&mut self, decode: Arc<InsnDecode>) {
        if self.entries.len() >= HISTORY_CAP {
            self.entries.drain(..HISTORY_CAP / 2);
        }
        self.entries.push(decode);
    }

    /// Emits the dependency chain that produced register `reg` as consumed
    /// by the most recently recorded instruction.
    ///
    /// The triggering instruction's line is emitted first, then each
    /// producer found walking backwards. A producer whose vaddr equals the
    /// previously emitted one is suppressed (compact loops print each
    /// instruction once per burst).
    ///
    /// # Arguments
    ///
    /// * `reg` - Register index the triggering instruction consumes as an
    ///   address.
    /// * `emit` - Receives `(vaddr, disassembly)` for every chain line.
    pub fn walk(&self, reg: u8, emit: &mut dyn FnMut(u64, &str)) {
        let Some(trigger) = self.entries.last() else {
            return;
        };
        emit(trigger.vaddr, &trigger.disas);
        let mut last_emitted = trigger.vaddr;
        self.walk_from(self.entries.len() - 1, reg, &mut last_emitted, emit);
    }

    /// Finds the newest entry older than `from` whose `rd` is `reg`,
    /// emits it, and chases its sources.
    fn walk_from(
        &self,
        from: usize,
        reg: u8,
        last_emitted: &mut u64,
        emit: &mut dyn FnMut(u64, &str),
    ) {
        for i in (0..from).rev() {
            let producer = &self.entries[i];
            if producer.rd != Some(reg) {
                continue;
            }
            if producer.vaddr != *last_emitted {
                emit(producer.vaddr, &producer.disas);
                *last_emitted = producer.vaddr;
            }
            if producer.addr_source == AddrSource::Rd {
                // The value was synthesized from an immediate; this branch
                // of the chain is complete.
                return;
            }
            if let Some(rs1) = producer.rs1 {
                self.walk_from(i, rs1, last_emitted, emit);
            }
            // Needed when the address was combined through an add or so.
            if let Some(rs2) = producer.rs2 {
                self.walk_from(i, rs2, last_emitted, emit);
            }
            return;
        }
    }
}
