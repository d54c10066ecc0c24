//! Serde model and reader for the JSON-Lines replay trace.
//!
//! A trace is one JSON object per line. Two event kinds exist:
//!
//! ```text
//! {"event":"insn","cpu":0,"vaddr":4096,"opcode":1234,"disas":"00a00513 addi a0, zero, 10"}
//! {"event":"mem","cpu":0,"vaddr":8192,"paddr":268443648,"io":false}
//! ```
//!
//! An `insn` event is one instruction execution; a `mem` event describes a
//! memory access performed by the closest preceding `insn` event on the
//! same CPU. `cpu`, `opcode`, `haddr`, `symbol`, `paddr`, and `io` are
//! optional. Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::error::TraceError;

/// One recorded event of an execution trace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// One instruction execution.
    Insn {
        /// Executing virtual CPU index.
        #[serde(default)]
        cpu: usize,
        /// Virtual address of the instruction.
        vaddr: u64,
        /// Raw 32-bit opcode (little-endian byte order in memory).
        #[serde(default)]
        opcode: u32,
        /// Host address the instruction is mapped at; defaults to `vaddr`.
        #[serde(default)]
        haddr: Option<u64>,
        /// Textual disassembly, raw-encoding token first.
        disas: String,
        /// Symbol covering the instruction, if known.
        #[serde(default)]
        symbol: Option<String>,
    },
    /// One data memory access of the preceding instruction.
    Mem {
        /// Executing virtual CPU index.
        #[serde(default)]
        cpu: usize,
        /// Virtual address of the access.
        vaddr: u64,
        /// Resolved physical address, when the host knew one.
        #[serde(default)]
        paddr: Option<u64>,
        /// Whether the resolved address targets memory-mapped I/O.
        #[serde(default)]
        io: bool,
    },
}

/// Reads a whole trace file into memory.
///
/// # Arguments
///
/// * `path` - Path of the JSON-Lines trace file.
///
/// # Errors
///
/// Returns [`TraceError::Io`] when the file cannot be read and
/// [`TraceError::Parse`] (with a 1-based line number) for the first
/// malformed record.
pub fn read_trace(path: &Path) -> Result<Vec<TraceEvent>, TraceError> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| TraceError::Parse {
            line: idx + 1,
            source,
        })?;
        events.push(event);
    }

    Ok(events)
}
