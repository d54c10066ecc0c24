//! Error definitions for analysis installation and trace loading.
//!
//! This module defines the error types surfaced by the crate. It provides:
//! 1. **Configuration errors:** unknown options, unparseable values, and
//!    cache geometry violations detected at install time.
//! 2. **Trace errors:** I/O and per-line parse failures from the replay
//!    trace reader.
//!
//! All install-time errors are fatal; callers report the one-line
//! diagnostic and exit non-zero. Runtime conditions (IO accesses, gated
//! instructions, unknown mnemonics) are skips, not errors.

use std::fmt;
use std::io;

/// Errors produced while parsing analysis options or validating cache
/// geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An argument was not of the form `key=value`, or the key is not
    /// recognized. The associated value is the offending argument.
    UnknownOption(String),

    /// A value could not be parsed as the integer the key requires.
    InvalidValue {
        /// The option key.
        key: String,
        /// The unparseable value.
        value: String,
    },

    /// A value could not be parsed as a boolean (`on`/`off`, `true`/`false`,
    /// `yes`/`no`).
    InvalidBool {
        /// The option key.
        key: String,
        /// The unparseable value.
        value: String,
    },

    /// The `replace` option named an unknown eviction policy.
    UnknownPolicy(String),

    /// A cache's geometry violates a structural constraint.
    BadGeometry {
        /// Which cache the geometry belongs to (`"dcache"`, `"icache"`,
        /// `"L2 cache"`).
        cache: &'static str,
        /// Human-readable description of the violated constraint.
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownOption(opt) => {
                write!(f, "option parsing failed: {}", opt)
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "integer argument parsing failed: {}={}", key, value)
            }
            ConfigError::InvalidBool { key, value } => {
                write!(f, "boolean argument parsing failed: {}={}", key, value)
            }
            ConfigError::UnknownPolicy(name) => {
                write!(f, "invalid replacement policy: {}", name)
            }
            ConfigError::BadGeometry { cache, reason } => {
                write!(
                    f,
                    "{} cannot be constructed from given parameters: {}",
                    cache, reason
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors produced while reading a replay trace file.
#[derive(Debug)]
pub enum TraceError {
    /// The trace file could not be opened or read.
    Io(io::Error),

    /// A line of the trace was not a valid event record. The line number
    /// is 1-based.
    Parse {
        /// 1-based line number of the malformed record.
        line: usize,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::Io(e) => write!(f, "trace read failed: {}", e),
            TraceError::Parse { line, source } => {
                write!(f, "trace line {} is malformed: {}", line, source)
            }
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraceError::Io(e) => Some(e),
            TraceError::Parse { source, .. } => Some(source),
        }
    }
}

impl From<io::Error> for TraceError {
    fn from(e: io::Error) -> Self {
        TraceError::Io(e)
    }
}
