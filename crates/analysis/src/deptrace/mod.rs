//! Address-register dependency tracer.
//!
//! For every executed instruction that consumes an effective address in
//! `rs1` (loads, stores, atomics, `jalr`, `sfence`), this analysis prints
//! the chain of prior instructions that computed that address, walking a
//! per-CPU execution history backwards through destination-register
//! dependencies. Chains stream to stderr as `0x<vaddr> <disassembly>`
//! lines, one chain per triggering instruction, terminated by a separator
//! line.

/// Mnemonic classifier and operand extraction.
pub mod decode;

/// Bounded execution history and the backward walk.
pub mod history;

use std::io::Write;
use std::sync::{Arc, Mutex, RwLock};

use crate::host::{Analysis, HookId, HostInfo, InsnHooks, TranslationBlock};
use decode::{AddrSource, InsnDecode};
use history::History;

/// Separator printed after each dependency chain.
pub const CHAIN_SEPARATOR: &str = "@@@@@@@@@@@@@@@@@";

/// The dependency-tracing analysis core.
pub struct DepTracer {
    /// Classified instructions, indexed by hook handle. The write lock is
    /// taken at translation time only.
    decodes: RwLock<Vec<Arc<InsnDecode>>>,
    /// One execution history per virtual CPU.
    histories: Vec<Mutex<History>>,
}

impl DepTracer {
    /// Creates a tracer with one history per host vCPU.
    pub fn new(info: &HostInfo) -> Self {
        let vcpus = info.vcpus.max(1);
        Self {
            decodes: RwLock::new(Vec::new()),
            histories: (0..vcpus).map(|_| Mutex::new(History::new())).collect(),
        }
    }

    /// Records the executed instruction and, when it consumes an address,
    /// emits its dependency chain through `emit` (one call per output
    /// line, separator included).
    pub fn handle_exec(&self, vcpu_index: usize, hook: HookId, emit: &mut dyn FnMut(&str)) {
        let decode = {
            let decodes = self.decodes.read().unwrap();
            decodes.get(hook as usize).cloned()
        };
        let Some(decode) = decode else {
            return;
        };

        let traced_reg = match (decode.addr_source, decode.rs1) {
            (AddrSource::Rs1, Some(rs1)) => Some(rs1),
            _ => None,
        };

        let mut history = self.histories[vcpu_index % self.histories.len()]
            .lock()
            .unwrap();
        history.record(decode);

        if let Some(reg) = traced_reg {
            history.walk(reg, &mut |vaddr, disas| {
                emit(&format!("0x{:08x} {}", vaddr, disas));
            });
            emit(CHAIN_SEPARATOR);
        }
    }
}

impl Analysis for DepTracer {
    fn on_translation(&self, tb: &TranslationBlock) -> Vec<InsnHooks> {
        let mut decodes = self.decodes.write().unwrap();
        tb.insns
            .iter()
            .map(|insn| {
                decodes.push(Arc::new(decode::classify(insn.vaddr, &insn.disas)));
                InsnHooks {
                    exec: Some((decodes.len() - 1) as HookId),
                    mem: None,
                }
            })
            .collect()
    }

    fn on_insn_exec(&self, vcpu_index: usize, hook: HookId) {
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        self.handle_exec(vcpu_index, hook, &mut |line| {
            let _ = writeln!(out, "{}", line);
        });
    }
}
