//! Standalone replay host.
//!
//! `ReplayHost` stands in for an emulator: it feeds a recorded event
//! stream through an [`Analysis`], honoring the host contract. Each
//! distinct instruction address is translated once as a single-instruction
//! block and its hook subscriptions are memoized; an instruction whose
//! translation produced no hooks (for example, outside the instrumentation
//! window) is not memoized, so it is offered for translation again the
//! next time it executes.

use std::collections::HashMap;

use crate::host::{Analysis, HookId, HwAddr, InsnDesc, InsnHooks, MemAccess, TranslationBlock};
use crate::trace::TraceEvent;

/// Trace-driven host wrapping an analysis core.
pub struct ReplayHost<'a, A: Analysis> {
    analysis: &'a A,
    /// Memoized hook subscriptions per instruction vaddr.
    translations: HashMap<u64, InsnHooks>,
    /// Memory hook of the last executed instruction, per CPU.
    last_mem_hook: HashMap<usize, Option<HookId>>,
}

impl<'a, A: Analysis> ReplayHost<'a, A> {
    /// Creates a host around `analysis`.
    pub fn new(analysis: &'a A) -> Self {
        Self {
            analysis,
            translations: HashMap::new(),
            last_mem_hook: HashMap::new(),
        }
    }

    /// Replays a stream of events.
    pub fn run(&mut self, events: impl IntoIterator<Item = TraceEvent>) {
        for event in events {
            self.step(event);
        }
    }

    /// Replays a single event.
    pub fn step(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::Insn {
                cpu,
                vaddr,
                opcode,
                haddr,
                disas,
                symbol,
            } => {
                let hooks = match self.translations.get(&vaddr) {
                    Some(&hooks) => hooks,
                    None => {
                        let tb = TranslationBlock {
                            insns: vec![InsnDesc {
                                vaddr,
                                haddr: haddr.unwrap_or(vaddr),
                                data: opcode.to_le_bytes().to_vec(),
                                disas,
                                symbol,
                            }],
                        };
                        let hooks = self
                            .analysis
                            .on_translation(&tb)
                            .first()
                            .copied()
                            .unwrap_or_default();
                        if hooks != InsnHooks::default() {
                            self.translations.insert(vaddr, hooks);
                        }
                        hooks
                    }
                };

                self.last_mem_hook.insert(cpu, hooks.mem);
                if let Some(hook) = hooks.exec {
                    self.analysis.on_insn_exec(cpu, hook);
                }
            }
            TraceEvent::Mem {
                cpu,
                vaddr,
                paddr,
                io,
            } => {
                let Some(Some(hook)) = self.last_mem_hook.get(&cpu).copied() else {
                    return;
                };
                let access = MemAccess {
                    vaddr,
                    hwaddr: paddr.map(|phys_addr| HwAddr { phys_addr, is_io: io }),
                };
                self.analysis.on_mem_access(cpu, hook, &access);
            }
        }
    }

    /// Fires the exit callback, consuming the host.
    pub fn finish(self) {
        self.analysis.on_exit();
    }
}
