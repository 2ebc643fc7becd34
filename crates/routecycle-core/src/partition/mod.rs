//! Pass 1: streaming partition of the input into on-disk buckets.
//!
//! The input is read once as a byte stream and every parseable record is
//! appended, verbatim, to the bucket file selected by a stable hash of its
//! `(claim_id, status_code)` key. All records of one key therefore co-locate
//! in a single bucket, and pass 2 can analyze buckets independently.
//!
//! Partitioning is strictly single-threaded: the handle cache and the bucket
//! files are owned by this one pass, so no locking exists anywhere in it.

pub mod handle_cache;

pub use handle_cache::{BUFFER_SIZE, HandleCache};

use std::fmt;
use std::fs::File;
use std::hash::Hasher as _;
use std::io::{self, BufRead as _, BufReader};
use std::path::{Path, PathBuf};

use rustc_hash::FxHasher;

use crate::record::parse_record;

/// Default number of buckets. Must be a power of two.
pub const DEFAULT_BUCKETS: usize = 1024;

/// Maximum number of bucket handles kept open at once during pass 1.
pub const MAX_OPEN_HANDLES: usize = 128;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by the partition pass.
#[derive(Debug)]
pub enum PartitionError {
    /// The requested bucket count is not a power of two.
    ///
    /// The bucket index is computed as `hash & (B - 1)`, which only
    /// distributes correctly for powers of two; anything else is rejected up
    /// front rather than silently skewing the distribution.
    BucketCountNotPowerOfTwo {
        /// The rejected bucket count.
        given: usize,
    },

    /// A filesystem operation failed. Fatal; nothing is retried.
    Io {
        /// The path the operation was acting on.
        path: PathBuf,
        /// A short description of the failed operation.
        op: &'static str,
        /// The underlying I/O error.
        source: io::Error,
    },
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionError::BucketCountNotPowerOfTwo { given } => {
                write!(f, "bucket count must be a power of two, got {given}")
            }
            PartitionError::Io { path, op, source } => {
                write!(f, "{op} failed for {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for PartitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PartitionError::BucketCountNotPowerOfTwo { .. } => None,
            PartitionError::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Line counters accumulated while partitioning.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PartitionStats {
    /// Total lines read from the input, including skipped ones.
    pub lines_read: u64,
    /// Lines that were empty after stripping the terminator.
    pub empty_lines: u64,
    /// Lines that did not yield four pipe-separated fields.
    pub malformed_lines: u64,
    /// Lines appended to a bucket file.
    pub lines_written: u64,
}

// ---------------------------------------------------------------------------
// Bucket hashing
// ---------------------------------------------------------------------------

/// Computes the bucket index for a key.
///
/// The hash is a fixed, stable, byte-wise function of
/// `claim_id ++ "|" ++ status_code`; `num_buckets` must be a power of two so
/// the low bits select the bucket.
pub fn bucket_index(claim_id: &[u8], status_code: &[u8], num_buckets: usize) -> usize {
    debug_assert!(num_buckets.is_power_of_two());
    let mut hasher = FxHasher::default();
    hasher.write(claim_id);
    hasher.write(b"|");
    hasher.write(status_code);
    (hasher.finish() as usize) & (num_buckets - 1)
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Streams `input_path` once, appending each parseable record to its bucket
/// file under `work_dir`.
///
/// Returns the sorted paths of the buckets that received at least one record,
/// together with the line counters. Empty and malformed lines are skipped
/// silently (counted only). Each written line is the input line with its
/// terminator normalized to a single `\n`, so bucket files parse with the
/// same record parser as the input itself.
///
/// # Errors
///
/// - [`PartitionError::BucketCountNotPowerOfTwo`] before any I/O happens.
/// - [`PartitionError::Io`] for any open/read/append/flush failure; the
///   cache is closed on a best-effort basis and the error propagates.
pub fn partition_to_buckets(
    input_path: &Path,
    num_buckets: usize,
    work_dir: &Path,
) -> Result<(Vec<PathBuf>, PartitionStats), PartitionError> {
    if !num_buckets.is_power_of_two() {
        return Err(PartitionError::BucketCountNotPowerOfTwo { given: num_buckets });
    }

    let input = File::open(input_path).map_err(|source| PartitionError::Io {
        path: input_path.to_path_buf(),
        op: "open input",
        source,
    })?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, input);

    let mut cache = HandleCache::new(MAX_OPEN_HANDLES, work_dir);
    let mut written = vec![false; num_buckets];
    let mut stats = PartitionStats::default();

    let mut line = Vec::with_capacity(256);
    let result = loop {
        line.clear();
        let read = match reader.read_until(b'\n', &mut line) {
            Ok(n) => n,
            Err(source) => {
                break Err(PartitionError::Io {
                    path: input_path.to_path_buf(),
                    op: "read input",
                    source,
                });
            }
        };
        if read == 0 {
            break Ok(());
        }

        stats.lines_read += 1;
        let Some(record) = parse_record(&line) else {
            if crate::record::trim_line_terminator(&line).is_empty() {
                stats.empty_lines += 1;
            } else {
                stats.malformed_lines += 1;
            }
            continue;
        };

        let index = bucket_index(record.claim_id, record.status_code, num_buckets);
        let stripped = crate::record::trim_line_terminator(&line);
        if let Err(e) = cache.write(index, stripped) {
            break Err(e);
        }
        written[index] = true;
        stats.lines_written += 1;
    };

    // Close handles on every exit path; a close failure only surfaces when
    // the pass itself succeeded.
    let closed = cache.close_all();
    result?;
    closed?;

    let non_empty = written
        .iter()
        .enumerate()
        .filter(|(_, wrote)| **wrote)
        .map(|(index, _)| work_dir.join(format!("bucket_{index:04}.bin")))
        .collect();

    Ok((non_empty, stats))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::fs;
    use std::io::Write as _;

    use super::*;

    fn write_input(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("create temp input");
        f.write_all(contents).expect("write temp input");
        f
    }

    #[test]
    fn rejects_non_power_of_two_bucket_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_input(b"A|B|C|S\n");
        let err = partition_to_buckets(input.path(), 100, dir.path())
            .expect_err("must reject bucket count 100");
        assert!(matches!(
            err,
            PartitionError::BucketCountNotPowerOfTwo { given: 100 }
        ));
    }

    #[test]
    fn rejects_zero_buckets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_input(b"");
        let err =
            partition_to_buckets(input.path(), 0, dir.path()).expect_err("must reject zero");
        assert!(matches!(
            err,
            PartitionError::BucketCountNotPowerOfTwo { given: 0 }
        ));
    }

    #[test]
    fn missing_input_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = partition_to_buckets(Path::new("/no/such/input.psv"), 4, dir.path())
            .expect_err("must fail");
        let msg = err.to_string();
        assert!(msg.contains("open input"), "message: {msg}");
        assert!(msg.contains("input.psv"), "message: {msg}");
    }

    #[test]
    fn same_key_lands_in_one_bucket() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_input(b"A|B|C1|S1\nB|C|C1|S1\nC|A|C1|S1\n");
        let (paths, stats) =
            partition_to_buckets(input.path(), 16, dir.path()).expect("partition");

        assert_eq!(paths.len(), 1, "one key → one non-empty bucket");
        assert_eq!(stats.lines_written, 3);

        let contents = fs::read(&paths[0]).expect("read bucket");
        assert_eq!(contents, b"A|B|C1|S1\nB|C|C1|S1\nC|A|C1|S1\n");
    }

    #[test]
    fn crlf_lines_are_rewritten_with_lf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_input(b"A|B|C1|S1\r\nB|A|C1|S1\r\n");
        let (paths, _) = partition_to_buckets(input.path(), 4, dir.path()).expect("partition");
        let contents = fs::read(&paths[0]).expect("read bucket");
        assert_eq!(contents, b"A|B|C1|S1\nB|A|C1|S1\n");
    }

    #[test]
    fn malformed_and_empty_lines_are_counted_not_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_input(b"A|B|C1|S1\n\nnot enough fields\nA|B\n\r\n");
        let (_, stats) = partition_to_buckets(input.path(), 4, dir.path()).expect("partition");
        assert_eq!(stats.lines_read, 5);
        assert_eq!(stats.empty_lines, 2);
        assert_eq!(stats.malformed_lines, 2);
        assert_eq!(stats.lines_written, 1);
    }

    #[test]
    fn total_bucket_bytes_match_written_records() {
        // Bytes across bucket files = bytes of parseable records plus a
        // newline each.
        let dir = tempfile::tempdir().expect("tempdir");
        let records: Vec<String> = (0..200)
            .map(|i| format!("s{i}|d{i}|claim{}|st{}", i % 17, i % 5))
            .collect();
        let mut body = records.join("\n");
        body.push('\n');
        let input = write_input(body.as_bytes());

        let (paths, stats) = partition_to_buckets(input.path(), 8, dir.path()).expect("partition");
        assert_eq!(stats.lines_written, 200);

        let expected: usize = records.iter().map(|r| r.len() + 1).sum();
        let actual: usize = paths
            .iter()
            .map(|p| fs::metadata(p).expect("metadata").len() as usize)
            .sum();
        assert_eq!(actual, expected);
    }

    #[test]
    fn bucket_choice_is_stable_per_key() {
        // Identical key bytes always map to the same index, regardless
        // of bucket count (as long as it is a power of two).
        for buckets in [2usize, 16, 1024] {
            let a = bucket_index(b"C1", b"S1", buckets);
            let b = bucket_index(b"C1", b"S1", buckets);
            assert_eq!(a, b);
            assert!(a < buckets);
        }
    }

    #[test]
    fn no_parseable_records_yields_no_buckets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_input(b"\n\nnonsense\n");
        let (paths, stats) = partition_to_buckets(input.path(), 4, dir.path()).expect("partition");
        assert!(paths.is_empty());
        assert_eq!(stats.lines_written, 0);
    }
}
