//! Dynamic-analysis cores for an emulation host.
//!
//! This crate observes a stream of executed instructions and memory accesses
//! produced by an emulator and derives information about program behavior.
//! It provides:
//! 1. **Cache profiling:** a multi-level, multi-core cache simulator with a
//!    split-tag addressing scheme, pluggable eviction, and per-instruction
//!    miss attribution ([`cachesim`]).
//! 2. **Dependency tracing:** a RISC-V address-register dependency tracer
//!    that reconstructs, for every memory-referencing instruction, the chain
//!    of instructions that computed its effective address ([`deptrace`]).
//! 3. **Host contract:** the translation/execution callback interface an
//!    emulator implements to drive either analysis ([`host`]).
//! 4. **Replay:** a standalone host that feeds a recorded JSON-Lines trace
//!    through an analysis ([`trace`], [`replay`]).

/// Split-tag set-associative cache engine (sets, lookup, eviction).
pub mod cache;
/// Cache-profiling analysis (per-core hierarchy, counters, reports).
pub mod cachesim;
/// Option parsing and cache geometry validation.
pub mod config;
/// Address-register dependency tracer (classifier, history, walker).
pub mod deptrace;
/// Error types for configuration and trace loading.
pub mod error;
/// Host contract: translation blocks, access info, and the `Analysis` trait.
pub mod host;
/// Standalone replay host driving an analysis from a recorded trace.
pub mod replay;
/// Serde model and reader for the JSON-Lines replay trace.
pub mod trace;

/// Cache-profiling analysis; construct with `CacheProfiler::new`.
pub use crate::cachesim::CacheProfiler;
/// Parsed `key=value` options for the cache profiler.
pub use crate::config::CacheSimConfig;
/// Address-dependency tracer; construct with `DepTracer::new`.
pub use crate::deptrace::DepTracer;
/// The callback interface implemented by both analyses.
pub use crate::host::{Analysis, HostInfo};
/// Trace-driven host; wraps an `Analysis` and replays events through it.
pub use crate::replay::ReplayHost;
