//! Trace-replay CLI for the rvprobe analysis cores.
//!
//! This binary replays a recorded execution trace (JSON Lines) through one
//! of the analyses:
//! 1. **cache:** simulate the split-tag cache hierarchy and report per-core
//!    miss statistics plus the worst-offender instructions.
//! 2. **deps:** print the address-register dependency chain of every
//!    memory-referencing instruction to stderr.

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};

use rvprobe_core::trace::read_trace;
use rvprobe_core::{Analysis, CacheProfiler, CacheSimConfig, DepTracer, HostInfo, ReplayHost};

#[derive(Parser, Debug)]
#[command(
    name = "rvprobe",
    author,
    version,
    about = "Replay an execution trace through the rvprobe analysis cores",
    long_about = "Replay a recorded instruction/memory trace (JSON Lines) through the \
split-tag cache profiler or the address-dependency tracer.\n\nExamples:\n  \
rvprobe cache -f boot.trace -a dassoc=4 -a replace=fifo -a l2=on\n  \
rvprobe cache -f bench.trace --vcpus 4 --system -a magic=on\n  \
rvprobe deps -f qsort.trace"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate the cache hierarchy over a trace and report miss statistics.
    Cache {
        /// Trace file to replay (JSON Lines).
        #[arg(short, long)]
        file: String,

        /// Analysis option as key=value (repeatable), e.g. dassoc=4,
        /// l2cachesize=1048576, replace=rand, magic=on, limit=16.
        #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,

        /// Number of virtual CPUs recorded in the trace.
        #[arg(long, default_value_t = 1)]
        vcpus: usize,

        /// Treat the trace as full-system emulation (fetches are keyed by
        /// host address, one cache group per vCPU by default).
        #[arg(long)]
        system: bool,
    },

    /// Print the dependency chain of every address-consuming instruction.
    Deps {
        /// Trace file to replay (JSON Lines).
        #[arg(short, long)]
        file: String,

        /// Number of virtual CPUs recorded in the trace.
        #[arg(long, default_value_t = 1)]
        vcpus: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Cache {
            file,
            args,
            vcpus,
            system,
        } => {
            let info = HostInfo {
                system_emulation: system,
                vcpus,
            };
            let config = CacheSimConfig::from_args(&args, &info).unwrap_or_else(|e| {
                eprintln!("{}", e);
                process::exit(1);
            });
            let profiler = CacheProfiler::new(config, &info).unwrap_or_else(|e| {
                eprintln!("{}", e);
                process::exit(1);
            });
            replay(&file, &profiler);
        }
        Commands::Deps { file, vcpus } => {
            let info = HostInfo {
                system_emulation: false,
                vcpus,
            };
            let tracer = DepTracer::new(&info);
            replay(&file, &tracer);
        }
    }
}

/// Loads the trace and runs it through `analysis`, firing the exit
/// callback at the end. Exits the process on a trace read error.
fn replay<A: Analysis>(file: &str, analysis: &A) {
    let events = read_trace(Path::new(file)).unwrap_or_else(|e| {
        eprintln!("{}", e);
        process::exit(1);
    });

    let mut host = ReplayHost::new(analysis);
    host.run(events);
    host.finish();
}
