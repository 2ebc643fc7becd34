//! The two-pass driver: partition, analyze, reduce.
//!
//! [`solve`] owns the run end to end. It creates the temporary work
//! directory, streams the input into buckets (pass 1), fans the non-empty
//! buckets out to the selected executor (pass 2), and reduces the local
//! results to the single global best. The work directory is owned by a
//! [`tempfile::TempDir`] guard, so it is removed on every exit path,
//! including failures.

pub mod executor;

pub use executor::{ExecutorKind, PROCESS_CHUNK, RC_EXECUTOR_ENV, serve_process_worker};

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::partition::{DEFAULT_BUCKETS, PartitionError, partition_to_buckets};
use crate::record::BucketResult;
use crate::solver::executor::{run_processes, run_serial, run_threads};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by the solve pipeline.
#[derive(Debug)]
pub enum SolveError {
    /// Pass 1 failed (bad bucket count or an I/O failure).
    Partition(PartitionError),

    /// The temporary work directory could not be created.
    WorkDir {
        /// A short description of the failed operation.
        op: &'static str,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A worker failed while reading or analyzing a bucket file.
    Bucket {
        /// The bucket the worker was processing.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The isolated process pool broke down (spawn, pipe, or protocol
    /// failure, or a worker exiting non-zero).
    ProcessPool {
        /// A description of what went wrong.
        detail: String,
    },

    /// The winning key is not valid UTF-8 and cannot be rendered.
    WinningKeyNotUtf8 {
        /// Which half of the key failed to decode.
        field: &'static str,
    },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Partition(e) => write!(f, "partitioning failed: {e}"),
            SolveError::WorkDir { op, source } => write!(f, "{op} failed: {source}"),
            SolveError::Bucket { path, source } => {
                write!(f, "bucket {} failed: {source}", path.display())
            }
            SolveError::ProcessPool { detail } => write!(f, "process pool failed: {detail}"),
            SolveError::WinningKeyNotUtf8 { field } => {
                write!(f, "winning key has non-UTF-8 {field}")
            }
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::Partition(e) => Some(e),
            SolveError::WorkDir { source, .. } | SolveError::Bucket { source, .. } => Some(source),
            SolveError::ProcessPool { .. } | SolveError::WinningKeyNotUtf8 { .. } => None,
        }
    }
}

impl From<PartitionError> for SolveError {
    fn from(e: PartitionError) -> Self {
        SolveError::Partition(e)
    }
}

// ---------------------------------------------------------------------------
// Options and result
// ---------------------------------------------------------------------------

/// Tunables for one solve run.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Number of partition buckets. Must be a power of two.
    pub num_buckets: usize,
    /// Worker count for the parallel executors. `None` = available CPUs.
    pub workers: Option<usize>,
    /// Programmatic executor request. The `RC_EXECUTOR` environment
    /// variable, when set to a recognized value, overrides this.
    pub executor: Option<ExecutorKind>,
    /// Executable to re-run for isolated workers. `None` = the current
    /// executable, which is correct whenever the embedding binary handles
    /// the hidden worker mode.
    pub worker_exe: Option<PathBuf>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            num_buckets: DEFAULT_BUCKETS,
            workers: None,
            executor: None,
            worker_exe: None,
        }
    }
}

/// The global result: the winning key, rendered, and its cycle length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// `claim_id` of the winning key, decoded as UTF-8.
    pub claim_id: String,
    /// `status_code` of the winning key, decoded as UTF-8.
    pub status_code: String,
    /// Length of the globally longest simple cycle (≥ 1).
    pub cycle_length: usize,
}

impl CycleSummary {
    fn from_bucket_result(result: BucketResult) -> Result<Self, SolveError> {
        let claim_id = String::from_utf8(result.claim_id.into_vec())
            .map_err(|_| SolveError::WinningKeyNotUtf8 { field: "claim_id" })?;
        let status_code = String::from_utf8(result.status_code.into_vec()).map_err(|_| {
            SolveError::WinningKeyNotUtf8 {
                field: "status_code",
            }
        })?;
        Ok(Self {
            claim_id,
            status_code,
            cycle_length: result.cycle_length,
        })
    }
}

// ---------------------------------------------------------------------------
// solve
// ---------------------------------------------------------------------------

/// Finds the longest simple cycle across all per-key subgraphs of the input.
///
/// Returns `Ok(None)` when no cycle exists anywhere. Partial results are
/// never produced: the run either reduces to one winner or fails with the
/// first fatal error, and the work directory is torn down either way.
pub fn solve(
    input_path: &Path,
    options: &SolveOptions,
) -> Result<Option<CycleSummary>, SolveError> {
    let total_start = Instant::now();
    let executor = ExecutorKind::resolve(options.executor);
    let workers = options.workers.unwrap_or_else(num_cpus::get).max(1);

    info!(
        input = %input_path.display(),
        buckets = options.num_buckets,
        workers,
        executor = executor.as_str(),
        "starting two-pass solve"
    );

    let work_dir = tempfile::Builder::new()
        .prefix("routing_cycles_")
        .tempdir()
        .map_err(|source| SolveError::WorkDir {
            op: "create work directory",
            source,
        })?;

    // Pass 1: partition the stream into key-local buckets.
    let pass1_start = Instant::now();
    let (bucket_paths, stats) =
        partition_to_buckets(input_path, options.num_buckets, work_dir.path())?;
    let pass1_secs = pass1_start.elapsed().as_secs_f64();

    if stats.malformed_lines > 0 {
        warn!(
            malformed = stats.malformed_lines,
            read = stats.lines_read,
            written = stats.lines_written,
            "pass 1 skipped malformed lines"
        );
    }
    info!(
        non_empty_buckets = bucket_paths.len(),
        elapsed_secs = pass1_secs,
        "pass 1 done"
    );

    if bucket_paths.is_empty() {
        info!(
            total_secs = total_start.elapsed().as_secs_f64(),
            "result: no cycles found"
        );
        return Ok(None);
    }

    // Pass 2: shared-nothing analysis of the buckets.
    let pass2_start = Instant::now();
    let best = match executor {
        ExecutorKind::Serial => run_serial(&bucket_paths)?,
        ExecutorKind::Threads => run_threads(&bucket_paths, workers)?,
        ExecutorKind::Processes => {
            let worker_exe = match &options.worker_exe {
                Some(path) => path.clone(),
                None => std::env::current_exe().map_err(|source| SolveError::ProcessPool {
                    detail: format!("cannot locate worker executable: {source}"),
                })?,
            };
            run_processes(&bucket_paths, workers, &worker_exe, work_dir.path())?
        }
    };
    let pass2_secs = pass2_start.elapsed().as_secs_f64();

    info!(
        buckets_processed = bucket_paths.len(),
        elapsed_secs = pass2_secs,
        "pass 2 done"
    );
    debug!(pass1_secs, pass2_secs, "timing breakdown");

    let summary = match best {
        Some(result) => Some(CycleSummary::from_bucket_result(result)?),
        None => None,
    };

    match &summary {
        Some(s) => info!(
            cycle_length = s.cycle_length,
            total_secs = total_start.elapsed().as_secs_f64(),
            "result: longest cycle found"
        ),
        None => info!(
            total_secs = total_start.elapsed().as_secs_f64(),
            "result: no cycles found"
        ),
    }

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
