//! Per-key adjacency construction from one bucket file.
//!
//! Pass 1 guarantees that every record of a `(claim_id, status_code)` key
//! lives in exactly one bucket, so this builder never sees a partial key. It
//! reads the bucket in binary, groups edges by key, collapses duplicate
//! edges, and tracks the maximum out-degree per key, the signal the cycle
//! finders use to pick an algorithm.
//!
//! # Cycle Detection
//!
//! See the [`cycles`] submodule for the two finders: the O(|V|)
//! functional-graph walk and the canonical minimum-start DFS.

pub mod cycles;

pub use cycles::{longest_cycle, longest_cycle_dfs, longest_cycle_functional};

use std::fs::File;
use std::io::{self, BufRead as _, BufReader};
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::partition::BUFFER_SIZE;
use crate::record::{GroupKey, parse_record};

/// A graph node: the raw bytes of a source or destination field.
pub type Node = Box<[u8]>;

/// Deduplicated adjacency: source node → set of destination nodes.
pub type Adjacency = FxHashMap<Node, FxHashSet<Node>>;

/// One key's subgraph inside a bucket.
#[derive(Debug, Default)]
pub struct KeyGraph {
    /// Edges of the subgraph, duplicate records collapsed.
    pub adjacency: Adjacency,
    /// Largest out-degree over unique edges. `<= 1` means the graph is
    /// functional and the linear walk applies.
    pub max_out_degree: usize,
}

impl KeyGraph {
    fn insert_edge(&mut self, source: &[u8], destination: &[u8]) {
        let targets = self.adjacency.entry(Node::from(source)).or_default();
        if targets.insert(Node::from(destination)) && targets.len() > self.max_out_degree {
            self.max_out_degree = targets.len();
        }
    }
}

/// All per-key subgraphs of one bucket.
///
/// Consumers iterate with `into_iter()` and drop each [`KeyGraph`] before
/// requesting the next, so worker memory tracks the largest key, not the
/// whole bucket history.
pub type GroupedAdjacency = FxHashMap<GroupKey, KeyGraph>;

/// Reads a bucket file and builds the grouped adjacency for every key in it.
///
/// Lines parse with the same rules as the input file; anything the
/// partitioner would have skipped is skipped here too, which makes the
/// builder safe to point at arbitrary record files, not just pass-1 output.
pub fn read_grouped_adjacency(bucket_path: &Path) -> io::Result<GroupedAdjacency> {
    let file = File::open(bucket_path)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);

    let mut grouped = GroupedAdjacency::default();
    let mut line = Vec::with_capacity(256);
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let Some(record) = parse_record(&line) else {
            continue;
        };

        let key: GroupKey = (
            Box::from(record.claim_id),
            Box::from(record.status_code),
        );
        grouped
            .entry(key)
            .or_default()
            .insert_edge(record.source, record.destination);
    }

    Ok(grouped)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
