//! Executor strategies for the analysis pass.
//!
//! Pass 2 is embarrassingly parallel over buckets and shared-nothing, so the
//! scheduler only needs a way to run [`process_bucket`] over a set of paths
//! and fold the results. Three interchangeable strategies exist:
//!
//! - [`ExecutorKind::Serial`]: in order, on the calling thread. Useful for
//!   debugging and as the baseline in tests.
//! - [`ExecutorKind::Threads`]: a pool of worker threads pulling bucket
//!   indices from a shared counter. The default: threads execute CPU-bound
//!   code in parallel with shared memory, and bucket files are read-only
//!   after pass 1, so no further synchronization is needed.
//! - [`ExecutorKind::Processes`]: a pool of isolated child processes (own
//!   heap, own allocator) fed bucket file names over stdin and answering one
//!   result line per bucket. Costs extra memory and IPC; exists so the same
//!   run can be reproduced without any shared address space at all.
//!
//! All three fold local results in bucket order, so equal-length ties
//! resolve to the lowest-indexed bucket and the observable result is
//! identical whichever strategy ran. The `RC_EXECUTOR` environment variable
//! forces a strategy for testing.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use tracing::debug;

use crate::record::{BucketResult, trim_line_terminator};
use crate::solver::SolveError;
use crate::worker::process_bucket;

/// Environment variable forcing the executor choice
/// (`threads` | `processes` | `serial`).
pub const RC_EXECUTOR_ENV: &str = "RC_EXECUTOR";

/// Bucket file names are streamed to isolated workers in chunks of this many
/// per round-robin turn, amortizing pipe traffic.
pub const PROCESS_CHUNK: usize = 16;

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

/// The three pass-2 execution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    /// Run buckets sequentially on the calling thread.
    Serial,
    /// Worker-thread pool sized to the configured worker count.
    Threads,
    /// Pool of isolated child processes communicating over pipes.
    Processes,
}

impl ExecutorKind {
    /// Reads the `RC_EXECUTOR` override, if set to a recognized value.
    pub fn from_env() -> Option<Self> {
        match std::env::var(RC_EXECUTOR_ENV).ok()?.to_ascii_lowercase().as_str() {
            "serial" => Some(ExecutorKind::Serial),
            "threads" => Some(ExecutorKind::Threads),
            "processes" => Some(ExecutorKind::Processes),
            _ => None,
        }
    }

    /// Resolves the strategy to use: the environment override wins, then the
    /// programmatic request, then auto. Auto is always the thread pool:
    /// threads here run CPU-bound work in parallel with shared memory, so
    /// the isolated pool is never required, only forceable.
    pub fn resolve(requested: Option<Self>) -> Self {
        Self::from_env()
            .or(requested)
            .unwrap_or(ExecutorKind::Threads)
    }

    /// Readable policy name for diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutorKind::Serial => "serial",
            ExecutorKind::Threads => "threads",
            ExecutorKind::Processes => "processes",
        }
    }
}

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Folds one local result into the running best. Strictly greater wins, so
/// ties keep the earliest entry in fold order.
fn keep_best(best: &mut Option<BucketResult>, candidate: Option<BucketResult>) {
    let Some(candidate) = candidate else {
        return;
    };
    let is_better = best
        .as_ref()
        .map_or(true, |current| candidate.cycle_length > current.cycle_length);
    if is_better {
        debug!(
            claim_id = %String::from_utf8_lossy(&candidate.claim_id),
            status_code = %String::from_utf8_lossy(&candidate.status_code),
            cycle_length = candidate.cycle_length,
            "new best cycle"
        );
        *best = Some(candidate);
    }
}

/// Folds per-bucket slots in bucket order.
fn reduce_slots(slots: Vec<Option<BucketResult>>) -> Option<BucketResult> {
    let mut best = None;
    for local in slots {
        keep_best(&mut best, local);
    }
    best
}

// ---------------------------------------------------------------------------
// Serial
// ---------------------------------------------------------------------------

/// Processes the buckets in order on the calling thread.
pub(crate) fn run_serial(bucket_paths: &[PathBuf]) -> Result<Option<BucketResult>, SolveError> {
    let mut best = None;
    for path in bucket_paths {
        let local = process_bucket(path).map_err(|source| SolveError::Bucket {
            path: path.clone(),
            source,
        })?;
        keep_best(&mut best, local);
    }
    Ok(best)
}

// ---------------------------------------------------------------------------
// Thread pool
// ---------------------------------------------------------------------------

/// Processes the buckets on a pool of `workers` threads.
///
/// Workers claim bucket indices from a shared atomic counter and send each
/// local result, tagged with its index, over a channel. Results land in
/// per-bucket slots and are folded in bucket order after the pool drains,
/// so the outcome matches the serial executor exactly. On the first worker
/// error the remaining work is abandoned and the error is returned after
/// the pool joins.
pub(crate) fn run_threads(
    bucket_paths: &[PathBuf],
    workers: usize,
) -> Result<Option<BucketResult>, SolveError> {
    let worker_count = workers.clamp(1, bucket_paths.len().max(1));
    let next_index = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let (tx, rx) = crossbeam_channel::unbounded();

    let mut slots: Vec<Option<BucketResult>> = Vec::new();
    slots.resize_with(bucket_paths.len(), || None);
    let mut first_error: Option<SolveError> = None;

    thread::scope(|scope| {
        for _ in 0..worker_count {
            let tx = tx.clone();
            let next_index = &next_index;
            let failed = &failed;
            scope.spawn(move || {
                loop {
                    if failed.load(Ordering::Relaxed) {
                        break;
                    }
                    let index = next_index.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = bucket_paths.get(index) else {
                        break;
                    };
                    let outcome = process_bucket(path).map_err(|source| SolveError::Bucket {
                        path: path.clone(),
                        source,
                    });
                    let is_err = outcome.is_err();
                    if is_err {
                        failed.store(true, Ordering::Relaxed);
                    }
                    if tx.send((index, outcome)).is_err() || is_err {
                        break;
                    }
                }
            });
        }
        drop(tx);

        for (index, outcome) in rx {
            match outcome {
                Ok(local) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = local;
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
    });

    match first_error {
        Some(e) => Err(e),
        None => Ok(reduce_slots(slots)),
    }
}

// ---------------------------------------------------------------------------
// Isolated process pool
// ---------------------------------------------------------------------------

/// Processes the buckets on a pool of isolated child processes.
///
/// Each child is a re-execution of `worker_exe` in the hidden worker mode
/// (see [`serve_process_worker`]); the work directory travels as an argument
/// and only the ASCII bucket file names cross the pipe. File names are dealt
/// round-robin in chunks of [`PROCESS_CHUNK`], and each child answers its
/// feed in order, so the reader thread per child can tag every result line
/// with its bucket index. Results fold in bucket order, matching the other
/// executors.
pub(crate) fn run_processes(
    bucket_paths: &[PathBuf],
    workers: usize,
    worker_exe: &Path,
    work_dir: &Path,
) -> Result<Option<BucketResult>, SolveError> {
    let chunk_count = bucket_paths.len().div_ceil(PROCESS_CHUNK);
    let worker_count = workers.clamp(1, chunk_count.max(1));

    // The deal is fixed up front so each reader knows which bucket the
    // n-th answer of its child belongs to.
    let mut assignments: Vec<Vec<usize>> = vec![Vec::new(); worker_count];
    for (chunk_index, chunk) in bucket_paths.chunks(PROCESS_CHUNK).enumerate() {
        let base = chunk_index * PROCESS_CHUNK;
        assignments[chunk_index % worker_count].extend(base..base + chunk.len());
    }

    let mut children: Vec<Child> = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let child = Command::new(worker_exe)
            .arg("--process-worker")
            .arg(work_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| SolveError::ProcessPool {
                detail: format!("failed to spawn {}: {source}", worker_exe.display()),
            })?;
        children.push(child);
    }

    let mut feeders: Vec<BufWriter<std::process::ChildStdin>> = Vec::with_capacity(worker_count);
    let mut outputs: Vec<ChildStdout> = Vec::with_capacity(worker_count);
    for child in &mut children {
        match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => {
                feeders.push(BufWriter::new(stdin));
                outputs.push(stdout);
            }
            _ => {
                return Err(SolveError::ProcessPool {
                    detail: "worker spawned without stdio pipes".to_owned(),
                });
            }
        }
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut slots: Vec<Option<BucketResult>> = Vec::new();
    slots.resize_with(bucket_paths.len(), || None);
    let mut first_error: Option<SolveError> = None;

    thread::scope(|scope| {
        for (worker, stdout) in outputs.into_iter().enumerate() {
            let tx = tx.clone();
            let assigned = &assignments[worker];
            scope.spawn(move || read_worker_results(stdout, assigned, &tx));
        }
        drop(tx);

        // Feed file names round-robin; children answer while we write, and
        // the reader threads drain their stdout so neither side can stall.
        'feed: for (chunk_index, chunk) in bucket_paths.chunks(PROCESS_CHUNK).enumerate() {
            let feeder = &mut feeders[chunk_index % worker_count];
            for path in chunk {
                if let Err(e) = write_bucket_name(feeder, path) {
                    // The root cause; reader-side fallout must not mask it.
                    first_error = Some(e);
                    break 'feed;
                }
            }
        }
        // Closing stdin tells each child it is done.
        drop(feeders);

        for (index, outcome) in rx {
            match outcome {
                Ok(local) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = local;
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
    });

    for mut child in children {
        let status = child.wait().map_err(|source| SolveError::ProcessPool {
            detail: format!("failed to reap worker: {source}"),
        })?;
        if !status.success() && first_error.is_none() {
            first_error = Some(SolveError::ProcessPool {
                detail: format!("worker exited with {status}"),
            });
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(reduce_slots(slots)),
    }
}

/// Writes one bucket file name (ASCII by construction) to a feeder pipe.
fn write_bucket_name(
    feeder: &mut BufWriter<std::process::ChildStdin>,
    path: &Path,
) -> Result<(), SolveError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| SolveError::ProcessPool {
            detail: format!("bucket path has no file name: {}", path.display()),
        })?;
    feeder
        .write_all(name.as_bytes())
        .and_then(|()| feeder.write_all(b"\n"))
        .and_then(|()| feeder.flush())
        .map_err(|source| SolveError::ProcessPool {
            detail: format!("failed to feed worker: {source}"),
        })
}

/// Reader-thread body: pairs each result line from one child with its
/// assigned bucket index and forwards it to the reduction channel.
fn read_worker_results(
    stdout: ChildStdout,
    assigned: &[usize],
    tx: &crossbeam_channel::Sender<(usize, Result<Option<BucketResult>, SolveError>)>,
) {
    let mut reader = BufReader::new(stdout);
    let mut line = Vec::new();
    let mut answered = 0usize;
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                let Some(&index) = assigned.get(answered) else {
                    let _ = tx.send((
                        0,
                        Err(SolveError::ProcessPool {
                            detail: "worker answered more buckets than it was fed".to_owned(),
                        }),
                    ));
                    return;
                };
                answered += 1;
                let outcome = parse_result_line(&line).ok_or_else(|| SolveError::ProcessPool {
                    detail: format!(
                        "unparseable worker result line: {:?}",
                        String::from_utf8_lossy(&line)
                    ),
                });
                if tx.send((index, outcome)).is_err() {
                    return;
                }
            }
            Err(source) => {
                let _ = tx.send((
                    0,
                    Err(SolveError::ProcessPool {
                        detail: format!("failed to read worker output: {source}"),
                    }),
                ));
                return;
            }
        }
    }
    // Stdout closed early: the child died or was starved by a feed failure.
    if answered < assigned.len() {
        let _ = tx.send((
            0,
            Err(SolveError::ProcessPool {
                detail: format!("worker answered {answered} of {} buckets", assigned.len()),
            }),
        ));
    }
}

// ---------------------------------------------------------------------------
// Worker-side loop and wire frames
// ---------------------------------------------------------------------------

/// Serves the hidden isolated-worker mode.
///
/// Reads bucket file names (one per line) from `input`, processes each
/// bucket under `work_dir`, and answers one line per bucket on `output`, in
/// feed order: `claim_id|status_code|length` for a local best, `-` for
/// none. Frames stay raw bytes end to end; `claim_id` cannot contain `|`
/// (it is a bounded field of the input split) and the length is the final
/// field, so the parent parses with a first/last split even though
/// `status_code` may contain `|`.
pub fn serve_process_worker(
    work_dir: &Path,
    mut input: impl BufRead,
    mut output: impl Write,
) -> Result<(), SolveError> {
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = input
            .read_until(b'\n', &mut line)
            .map_err(|source| SolveError::ProcessPool {
                detail: format!("failed to read work feed: {source}"),
            })?;
        if read == 0 {
            break;
        }
        let name = trim_line_terminator(&line);
        if name.is_empty() {
            continue;
        }
        let name = std::str::from_utf8(name).map_err(|_| SolveError::ProcessPool {
            detail: "work feed sent a non-UTF-8 bucket name".to_owned(),
        })?;
        let path = work_dir.join(name);

        let local = process_bucket(&path).map_err(|source| SolveError::Bucket {
            path: path.clone(),
            source,
        })?;
        write_result_line(&mut output, local.as_ref()).map_err(|source| {
            SolveError::ProcessPool {
                detail: format!("failed to write result: {source}"),
            }
        })?;
    }
    Ok(())
}

/// Writes one result frame (see [`serve_process_worker`] for the format).
fn write_result_line(output: &mut impl Write, result: Option<&BucketResult>) -> io::Result<()> {
    match result {
        Some(result) => {
            output.write_all(&result.claim_id)?;
            output.write_all(b"|")?;
            output.write_all(&result.status_code)?;
            write!(output, "|{}", result.cycle_length)?;
            output.write_all(b"\n")?;
        }
        None => output.write_all(b"-\n")?,
    }
    output.flush()
}

/// Parses one result frame. Returns `None` if the frame is malformed.
fn parse_result_line(raw_line: &[u8]) -> Option<Option<BucketResult>> {
    let line = trim_line_terminator(raw_line);
    if line == b"-" {
        return Some(None);
    }

    let first_pipe = line.iter().position(|&b| b == b'|')?;
    let (claim_id, rest) = line.split_at(first_pipe);
    let rest = &rest[1..];
    let last_pipe = rest.iter().rposition(|&b| b == b'|')?;
    let (status_code, length_bytes) = rest.split_at(last_pipe);
    let cycle_length: usize = std::str::from_utf8(&length_bytes[1..])
        .ok()?
        .parse()
        .ok()?;

    Some(Some(BucketResult {
        claim_id: Box::from(claim_id),
        status_code: Box::from(status_code),
        cycle_length,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
