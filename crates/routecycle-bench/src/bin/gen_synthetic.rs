//! Generates a synthetic routing-claim dataset to disk.
//!
//! Every group carries a base ring plus chords, so the expected answer for
//! the whole file is `<first claim>,<status>,<nodes>` (any group ties).
//! Large `--nodes` or `--out-degree` values make downstream cycle
//! enumeration extremely expensive; the defaults are the intended scale.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use routecycle_bench::{ChordMode, GeneratorConfig, write_dataset_to_path};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChordModeArg {
    /// Fixed forward steps (i+2, i+3, …).
    Fixed,
    /// Per-group seeded random steps.
    Random,
}

#[derive(Parser)]
#[command(
    name = "gen-synthetic",
    about = "Generate a synthetic routing-claim dataset with known cycles"
)]
struct Args {
    /// Output file path.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Number of (claim_id, status) groups.
    #[arg(long, default_value_t = 1000)]
    groups: usize,

    /// Nodes per group (= the longest cycle length per group).
    #[arg(long, default_value_t = 32)]
    nodes: usize,

    /// Outgoing edges per node (1 = plain ring).
    #[arg(long, default_value_t = 2)]
    out_degree: usize,

    /// Status code shared by all lines.
    #[arg(long, default_value_t = 200)]
    status_code: u32,

    /// Chord selection mode.
    #[arg(long, value_enum, default_value = "fixed")]
    chord_mode: ChordModeArg,

    /// Seed for the random chord mode.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let config = GeneratorConfig {
        num_groups: args.groups,
        nodes: args.nodes,
        out_degree: args.out_degree,
        status_code: args.status_code,
        chord_mode: match args.chord_mode {
            ChordModeArg::Fixed => ChordMode::Fixed,
            ChordModeArg::Random => ChordMode::Random,
        },
        seed: args.seed,
    };

    eprintln!(
        "Generating {} groups × {} nodes × out-degree {} ({} chords) to {}...",
        config.num_groups,
        config.nodes,
        config.out_degree,
        config.chord_mode,
        args.output.display()
    );

    let lines = write_dataset_to_path(&args.output, &config)?;

    let meta = std::fs::metadata(&args.output)?;
    eprintln!(
        "Wrote {lines} lines, {:.1} MB; expected longest cycle: {}",
        meta.len() as f64 / (1024.0 * 1024.0),
        config.nodes
    );

    Ok(())
}
