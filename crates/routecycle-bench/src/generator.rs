//! Deterministic synthetic routing-claim dataset generator.
//!
//! Each group `g` gets `nodes` nodes named `S{g:06}_{i:02}`, a base ring
//! `i → (i+1) % nodes`, and chord edges that raise the out-degree:
//!
//! - [`ChordMode::Fixed`]: forward steps `i → (i+2)`, `i → (i+3)`, … up to
//!   `out_degree` outgoing edges per node.
//! - [`ChordMode::Random`]: per-group seeded random distinct steps in
//!   `[2, nodes)`.
//!
//! The longest simple cycle of every group is the full ring, so a dataset of
//! `nodes = N` has the known answer `N` regardless of chords, which is handy
//! for validating whatever consumes the file. Output is streamed line by
//! line; nothing is held in memory.
//!
//! Large `nodes` or `out_degree` make downstream cycle enumeration
//! extremely expensive; 32 nodes at out-degree 2 is the intended scale.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use rand::SeedableRng as _;

/// Write buffer for streaming generation (1 MiB).
const BUFFER_SIZE: usize = 1024 * 1024;

/// How chord edges are chosen within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordMode {
    /// Fixed forward steps: `i+2`, `i+3`, …
    Fixed,
    /// Per-group seeded random distinct steps in `[2, nodes)`.
    Random,
}

impl fmt::Display for ChordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChordMode::Fixed => f.write_str("fixed"),
            ChordMode::Random => f.write_str("random"),
        }
    }
}

/// Parameters for one generated dataset.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    /// Number of `(claim_id, status_code)` groups.
    pub num_groups: usize,
    /// Nodes per group; also the group's longest simple cycle length.
    pub nodes: usize,
    /// Outgoing edges per node (≥ 1; 1 = plain ring, functional shape).
    pub out_degree: usize,
    /// Status code shared by every line.
    pub status_code: u32,
    /// Chord selection mode.
    pub chord_mode: ChordMode,
    /// Seed for the random chord mode.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_groups: 1000,
            nodes: 32,
            out_degree: 2,
            status_code: 200,
            chord_mode: ChordMode::Fixed,
            seed: 42,
        }
    }
}

// ---------------------------------------------------------------------------
// Edge generation
// ---------------------------------------------------------------------------

/// Generates the `(src_index, dst_index)` edges of one group.
pub fn group_edges(group_id: usize, config: &GeneratorConfig) -> Vec<(usize, usize)> {
    let nodes = config.nodes;
    let mut edges = Vec::with_capacity(nodes * config.out_degree.max(1));

    // Per-group RNG so any group regenerates identically in isolation.
    let mut rng = StdRng::seed_from_u64(
        config
            .seed
            .wrapping_add((group_id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
    );

    for i in 0..nodes {
        edges.push((i, (i + 1) % nodes));

        match config.chord_mode {
            ChordMode::Fixed => {
                for step in 2..=config.out_degree {
                    edges.push((i, (i + step) % nodes));
                }
            }
            ChordMode::Random => {
                let mut steps: Vec<usize> = (2..nodes).collect();
                steps.shuffle(&mut rng);
                let chords = config.out_degree.saturating_sub(1).min(steps.len());
                for &step in &steps[..chords] {
                    edges.push((i, (i + step) % nodes));
                }
            }
        }
    }

    edges
}

// ---------------------------------------------------------------------------
// Streaming output
// ---------------------------------------------------------------------------

/// Streams the whole dataset to `writer`, returning the line count.
pub fn write_dataset(writer: &mut impl Write, config: &GeneratorConfig) -> io::Result<u64> {
    let mut total_lines = 0u64;

    for group_id in 0..config.num_groups {
        for (src, dst) in group_edges(group_id, config) {
            writeln!(
                writer,
                "S{group_id:06}_{src:02}|S{group_id:06}_{dst:02}|{group_id}|{}",
                config.status_code
            )?;
            total_lines += 1;
        }
    }

    writer.flush()?;
    Ok(total_lines)
}

/// Writes the dataset to a file, buffered. Returns the line count.
pub fn write_dataset_to_path(path: &Path, config: &GeneratorConfig) -> io::Result<u64> {
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, file);
    write_dataset(&mut writer, config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
