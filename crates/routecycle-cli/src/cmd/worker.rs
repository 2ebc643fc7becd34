//! The hidden isolated-worker mode behind `--process-worker`.
//!
//! The scheduler's process executor re-runs this binary with the work
//! directory as the flag's value, streams bucket file names on stdin, and
//! reads one result line per bucket from stdout. This module only wires the
//! process's stdio into the core worker loop.
use std::path::Path;

use routecycle_core::serve_process_worker;

use crate::error::CliError;

/// Serves bucket work for the parent scheduler until stdin closes.
pub fn run(work_dir: &Path) -> Result<(), CliError> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    serve_process_worker(work_dir, stdin.lock(), stdout.lock()).map_err(|e| CliError::Worker {
        detail: e.to_string(),
    })
}
