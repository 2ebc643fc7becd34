//! The default command: run the two-pass solve and print the result.
//!
//! Output is exactly one stdout line:
//! - `claim_id,status_code,length` when a cycle was found;
//! - `0` when no cycle exists anywhere.
//!
//! All diagnostics go to stderr via the logging layer; the result line is
//! the only stdout traffic, so the binary composes in pipelines.
use std::io::Write as _;
use std::path::Path;

use routecycle_core::{SolveOptions, solve};

use crate::error::CliError;

/// Runs the solve pipeline on `input_file` with `buckets` partitions.
///
/// # Errors
///
/// - [`CliError`] exit code 2 when the bucket count is not a power of two or
///   the input file does not exist (checked before pass 1 begins).
/// - [`CliError`] exit code 1 when the pipeline fails after startup.
pub fn run(input_file: &Path, buckets: usize) -> Result<(), CliError> {
    if !buckets.is_power_of_two() {
        return Err(CliError::BucketCountNotPowerOfTwo { given: buckets });
    }
    if !input_file.exists() {
        return Err(CliError::InputNotFound {
            path: input_file.to_path_buf(),
        });
    }

    let options = SolveOptions {
        num_buckets: buckets,
        ..SolveOptions::default()
    };
    let summary = solve(input_file, &options).map_err(|e| CliError::Solve {
        detail: e.to_string(),
    })?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match summary {
        Some(s) => writeln!(out, "{},{},{}", s.claim_id, s.status_code, s.cycle_length),
        None => writeln!(out, "0"),
    }
    .map_err(|e| CliError::Solve {
        detail: format!("failed to write result: {e}"),
    })
}
