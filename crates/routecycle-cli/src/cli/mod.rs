//! Clap CLI definition: root struct and shared argument types.
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use routecycle_core::DEFAULT_BUCKETS;

/// Stderr logging verbosity.
///
/// Maps one-to-one onto `tracing` levels; `warning` is the default so a
/// normal run prints nothing but the result line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Everything, including per-bucket progress and timing breakdowns.
    Debug,
    /// Pass summaries and the final result.
    Info,
    /// Only anomalies such as skipped malformed lines (default).
    Warning,
    /// Only fatal diagnostics.
    Error,
}

impl LogLevel {
    /// The equivalent `tracing` level.
    pub fn as_tracing_level(self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Root CLI struct for the `routecycle` binary.
#[derive(Parser)]
#[command(
    name = "routecycle",
    version,
    about = "Find the longest routing cycle in claim data",
    long_about = "Finds the longest simple directed cycle in pipe-delimited routing-claim\n\
                  records (source|destination|claim_id|status_code), grouped per\n\
                  (claim_id, status_code) key. Prints `claim_id,status_code,length`\n\
                  (or `0` when no cycle exists) to stdout."
)]
pub struct Cli {
    /// Path to the input file (pipe-delimited: source|destination|claim_id|status_code).
    #[arg(value_name = "INPUT", required_unless_present = "process_worker")]
    pub input_file: Option<PathBuf>,

    /// Number of buckets for partitioning (must be a power of two).
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BUCKETS)]
    pub buckets: usize,

    /// Stderr logging level.
    #[arg(long, value_enum, ignore_case = true, default_value = "warning")]
    pub log_level: LogLevel,

    /// Internal: serve as an isolated bucket worker for the given work
    /// directory, reading bucket file names from stdin.
    #[arg(long, value_name = "WORK_DIR", hide = true)]
    pub process_worker: Option<PathBuf>,
}
