//! Host contract between an emulator and the analysis cores.
//!
//! This module defines the interface an emulation host implements to drive
//! an analysis. It provides:
//! 1. **Host description:** emulation mode and vCPU count (`HostInfo`).
//! 2. **Translation data:** decoded instructions grouped into translation
//!    blocks (`TranslationBlock`, `InsnDesc`).
//! 3. **Runtime data:** memory access info with optional hardware address
//!    resolution (`MemAccess`, `HwAddr`).
//! 4. **Callbacks:** the `Analysis` trait fired at translation, execution,
//!    memory access, and exit time, with opaque per-instruction hook
//!    handles.
//!
//! Handles are plain integers chosen by the analysis at translation time
//! and passed back verbatim at execution time, so the analysis owns every
//! payload lifetime independently of the host's translation cache.

/// Static facts about the host driving an analysis.
#[derive(Debug, Clone, Copy)]
pub struct HostInfo {
    /// True when the host performs full-system emulation. Instruction
    /// fetches are then attributed to host-mapped physical addresses
    /// rather than guest virtual addresses.
    pub system_emulation: bool,
    /// Number of emulated virtual CPUs.
    pub vcpus: usize,
}

impl Default for HostInfo {
    /// User-mode emulation with a single vCPU.
    fn default() -> Self {
        Self {
            system_emulation: false,
            vcpus: 1,
        }
    }
}

/// One decoded instruction as presented by the host at translation time.
#[derive(Debug, Clone)]
pub struct InsnDesc {
    /// Guest virtual address of the instruction.
    pub vaddr: u64,
    /// Host address the instruction's memory is mapped at.
    pub haddr: u64,
    /// Raw opcode bytes; at least the first 4 bytes are present.
    pub data: Vec<u8>,
    /// Textual disassembly. The first whitespace-separated token is the raw
    /// encoding, the second the mnemonic.
    pub disas: String,
    /// Symbol covering the instruction, when the host resolved one.
    pub symbol: Option<String>,
}

impl InsnDesc {
    /// Returns the first four opcode bytes as a little-endian word, or
    /// `None` when fewer than four bytes are available.
    pub fn opcode_u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(..4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

/// A translation block: the host's unit of code translation.
#[derive(Debug, Clone)]
pub struct TranslationBlock {
    /// Instructions in guest program order.
    pub insns: Vec<InsnDesc>,
}

/// A resolved hardware address for a data access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwAddr {
    /// Physical address of the access.
    pub phys_addr: u64,
    /// True when the address targets memory-mapped I/O.
    pub is_io: bool,
}

/// Runtime description of one memory access.
#[derive(Debug, Clone, Copy)]
pub struct MemAccess {
    /// Guest virtual address of the access.
    pub vaddr: u64,
    /// Hardware address, when the host could resolve one.
    pub hwaddr: Option<HwAddr>,
}

/// Opaque per-instruction handle chosen by an analysis at translation time.
pub type HookId = u64;

/// Callback subscriptions for one translated instruction.
///
/// `on_translation` returns one entry per instruction, in order; a result
/// shorter than the block leaves the remaining instructions unhooked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsnHooks {
    /// Fire `on_insn_exec` with this handle each time the instruction
    /// executes.
    pub exec: Option<HookId>,
    /// Fire `on_mem_access` with this handle for each memory access the
    /// instruction performs.
    pub mem: Option<HookId>,
}

/// The callback interface implemented by an analysis core.
///
/// Callbacks may fire concurrently from multiple host threads (one per
/// emulated CPU); implementations synchronize internally. All callbacks
/// are synchronous and short.
pub trait Analysis: Send + Sync {
    /// Called when the host translates a block. Returns the execution and
    /// memory-access subscriptions for each instruction.
    fn on_translation(&self, tb: &TranslationBlock) -> Vec<InsnHooks>;

    /// Called when a subscribed instruction executes on vCPU `vcpu_index`.
    fn on_insn_exec(&self, vcpu_index: usize, hook: HookId);

    /// Called for each memory access of a subscribed instruction.
    fn on_mem_access(&self, vcpu_index: usize, hook: HookId, access: &MemAccess) {
        let _ = (vcpu_index, hook, access);
    }

    /// Called once when the host exits.
    fn on_exit(&self) {}
}
