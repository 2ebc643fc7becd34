//! Pass-2 bucket worker: one bucket in, one optional local best out.
//!
//! Pure composition of the graph builder and the cycle finders. Workers read
//! bucket files that are read-only after pass 1 and own every structure they
//! build, so any number of them can run side by side with no shared state.

use std::io;
use std::path::Path;

use crate::graph::{longest_cycle, read_grouped_adjacency};
use crate::record::BucketResult;

/// Processes one bucket file and returns its best cycle, if any.
///
/// Each per-key subgraph is measured with the finder matching its shape
/// (functional walk for max out-degree ≤ 1, canonical DFS otherwise) and
/// dropped before the next key is examined. Ties keep the first key seen.
pub fn process_bucket(bucket_path: &Path) -> io::Result<Option<BucketResult>> {
    let grouped = read_grouped_adjacency(bucket_path)?;

    let mut best: Option<BucketResult> = None;
    for ((claim_id, status_code), key_graph) in grouped {
        let cycle_length = longest_cycle(&key_graph.adjacency, key_graph.max_out_degree);
        if cycle_length == 0 {
            continue;
        }
        let is_better = best
            .as_ref()
            .map_or(true, |current| cycle_length > current.cycle_length);
        if is_better {
            best = Some(BucketResult {
                claim_id,
                status_code,
                cycle_length,
            });
        }
    }

    Ok(best)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::io::Write as _;

    use super::*;

    fn bucket_with(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("create temp bucket");
        f.write_all(contents).expect("write temp bucket");
        f
    }

    #[test]
    fn longest_key_wins_within_a_bucket() {
        let bucket = bucket_with(
            b"A|B|C1|S1\nB|A|C1|S1\nX|Y|C2|S2\nY|Z|C2|S2\nZ|W|C2|S2\nW|X|C2|S2\n",
        );
        let result = process_bucket(bucket.path())
            .expect("process")
            .expect("a cycle exists");
        assert_eq!(result.claim_id.as_ref(), b"C2");
        assert_eq!(result.status_code.as_ref(), b"S2");
        assert_eq!(result.cycle_length, 4);
    }

    #[test]
    fn self_loop_reports_length_one() {
        let bucket = bucket_with(b"A|A|C1|S1\n");
        let result = process_bucket(bucket.path())
            .expect("process")
            .expect("self-loop is a cycle");
        assert_eq!(result.cycle_length, 1);
    }

    #[test]
    fn branching_key_uses_the_dfs_finder() {
        // Two overlapping cycles force the general branch; longest is 3.
        let bucket = bucket_with(b"A|B|C1|S1\nB|A|C1|S1\nB|C|C1|S1\nC|A|C1|S1\n");
        let result = process_bucket(bucket.path())
            .expect("process")
            .expect("cycles exist");
        assert_eq!(result.cycle_length, 3);
    }

    #[test]
    fn acyclic_bucket_yields_none() {
        let bucket = bucket_with(b"A|B|C1|S1\nB|C|C1|S1\nQ|R|C2|S2\n");
        assert!(process_bucket(bucket.path()).expect("process").is_none());
    }

    #[test]
    fn duplicate_edges_do_not_change_the_answer() {
        let bucket = bucket_with(b"A|B|C1|S1\nA|B|C1|S1\nB|A|C1|S1\n");
        let result = process_bucket(bucket.path())
            .expect("process")
            .expect("cycle exists");
        assert_eq!(result.cycle_length, 2);
    }

    #[test]
    fn missing_bucket_is_an_error() {
        assert!(process_bucket(Path::new("/no/such/bucket.bin")).is_err());
    }
}
