#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod graph;
pub mod partition;
pub mod record;
pub mod solver;
pub mod worker;

pub use graph::{Adjacency, GroupedAdjacency, KeyGraph, read_grouped_adjacency};
pub use partition::{
    DEFAULT_BUCKETS, MAX_OPEN_HANDLES, PartitionError, PartitionStats, partition_to_buckets,
};
pub use record::{BucketResult, GroupKey, RawRecord, parse_record};
pub use solver::{
    CycleSummary, ExecutorKind, RC_EXECUTOR_ENV, SolveError, SolveOptions, serve_process_worker,
    solve,
};
pub use worker::process_bucket;

/// Returns the current version of the routecycle-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }
}
