//! LRU cache of open bucket-file handles.
//!
//! The partition pass appends to up to `B` bucket files but may only hold a
//! bounded number of file descriptors. [`HandleCache`] keeps the most
//! recently written buckets open (buffered, append mode) and transparently
//! closes the least recently used handle when the cap is reached. Reopening
//! in append mode is cheap and loses nothing.
//!
//! The cache is single-threaded by construction: pass 1 owns it exclusively,
//! so no synchronization exists here.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::partition::PartitionError;

/// Write-buffer size per open bucket handle (1 MiB).
pub const BUFFER_SIZE: usize = 1024 * 1024;

/// An insertion-ordered map of bucket index → buffered append handle.
///
/// Order is recency: index 0 is least recently used, the tail is most
/// recently used. [`HandleCache::write`] promotes on hit and evicts from the
/// front on overflow, so at most `max_handles` descriptors are open at any
/// moment.
pub struct HandleCache {
    max_handles: usize,
    work_dir: PathBuf,
    handles: IndexMap<usize, BufWriter<std::fs::File>>,
}

impl HandleCache {
    /// Creates a cache writing `bucket_<index>.bin` files under `work_dir`,
    /// holding at most `max_handles` open handles.
    pub fn new(max_handles: usize, work_dir: &Path) -> Self {
        Self {
            max_handles: max_handles.max(1),
            work_dir: work_dir.to_path_buf(),
            handles: IndexMap::with_capacity(max_handles.max(1)),
        }
    }

    /// Returns the on-disk path for a bucket index.
    pub fn bucket_path(&self, bucket_index: usize) -> PathBuf {
        self.work_dir.join(format!("bucket_{bucket_index:04}.bin"))
    }

    /// Appends `line` followed by a single `\n` to the bucket file.
    ///
    /// Opens the handle on demand, promoting it to most-recently-used and
    /// evicting the least-recently-used handle if the cache is full.
    pub fn write(&mut self, bucket_index: usize, line: &[u8]) -> Result<(), PartitionError> {
        // Promotion works by removal and re-insertion at the tail. The map
        // holds at most `max_handles` entries, so the shift is bounded.
        let mut handle = match self.handles.shift_remove(&bucket_index) {
            Some(handle) => handle,
            None => {
                while self.handles.len() >= self.max_handles {
                    match self.handles.shift_remove_index(0) {
                        Some((evicted_index, evicted)) => {
                            Self::close(evicted_index, evicted, &self.work_dir)?;
                        }
                        None => break,
                    }
                }

                let path = self.bucket_path(bucket_index);
                let file = OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(&path)
                    .map_err(|source| PartitionError::Io {
                        path,
                        op: "open bucket for append",
                        source,
                    })?;
                BufWriter::with_capacity(BUFFER_SIZE, file)
            }
        };

        let written = handle.write_all(line).and_then(|()| handle.write_all(b"\n"));
        self.handles.insert(bucket_index, handle);
        written.map_err(|source| PartitionError::Io {
            path: self.bucket_path(bucket_index),
            op: "append record",
            source,
        })
    }

    /// Number of handles currently open. Never exceeds the configured cap.
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    /// Flushes and closes every open handle.
    ///
    /// After this returns, every byte accepted by [`HandleCache::write`] is
    /// durable in its bucket file.
    pub fn close_all(&mut self) -> Result<(), PartitionError> {
        while let Some((index, handle)) = self.handles.shift_remove_index(0) {
            Self::close(index, handle, &self.work_dir)?;
        }
        Ok(())
    }

    fn close(
        index: usize,
        mut handle: BufWriter<std::fs::File>,
        work_dir: &Path,
    ) -> Result<(), PartitionError> {
        handle.flush().map_err(|source| PartitionError::Io {
            path: work_dir.join(format!("bucket_{index:04}.bin")),
            op: "flush bucket",
            source,
        })
        // The descriptor closes when the BufWriter drops here.
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
