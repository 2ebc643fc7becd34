//! CLI error types with associated exit codes.
//!
//! [`CliError`] is the top-level error type for the `routecycle` binary.
//! Every variant maps to a stable exit code via [`CliError::exit_code`]:
//!
//! - Exit code **2**: configuration/input failure, bad arguments or a
//!   missing input file, detected before pass 1 begins.
//! - Exit code **1**: runtime failure, the pipeline started but hit a
//!   fatal I/O or worker error. Partial results are never printed.
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CliError
// ---------------------------------------------------------------------------

/// All error conditions the `routecycle` CLI can produce.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: configuration / input failures ---
    /// `--buckets` is not a power of two.
    BucketCountNotPowerOfTwo {
        /// The rejected value.
        given: usize,
    },

    /// The input file does not exist.
    InputNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// No input file was given (only reachable when clap validation is
    /// bypassed, e.g. by an embedding caller).
    InputRequired,

    // --- Exit code 1: runtime failures ---
    /// The solve pipeline failed after startup.
    Solve {
        /// The underlying failure, rendered.
        detail: String,
    },

    /// The hidden isolated-worker mode failed.
    Worker {
        /// The underlying failure, rendered.
        detail: String,
    },
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BucketCountNotPowerOfTwo { .. }
            | Self::InputNotFound { .. }
            | Self::InputRequired => 2,
            Self::Solve { .. } | Self::Worker { .. } => 1,
        }
    }

    /// Returns a human-readable error message suitable for stderr.
    pub fn message(&self) -> String {
        match self {
            Self::BucketCountNotPowerOfTwo { given } => {
                format!("error: --buckets must be a power of two, got {given}")
            }
            Self::InputNotFound { path } => {
                format!("error: input file not found: {}", path.display())
            }
            Self::InputRequired => "error: an input file is required".to_owned(),
            Self::Solve { detail } => format!("error: {detail}"),
            Self::Worker { detail } => format!("error: worker failed: {detail}"),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
