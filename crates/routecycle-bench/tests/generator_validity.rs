//! The generator's output must be valid input for the solver, with the
//! known answer `nodes` per group.
#![allow(clippy::expect_used)]

use routecycle_bench::{ChordMode, GeneratorConfig, write_dataset, write_dataset_to_path};
use routecycle_core::{ExecutorKind, SolveOptions, parse_record, solve};

#[test]
fn every_generated_line_parses_as_a_record() {
    let config = GeneratorConfig {
        num_groups: 5,
        nodes: 6,
        out_degree: 2,
        chord_mode: ChordMode::Random,
        ..GeneratorConfig::default()
    };
    let mut buffer = Vec::new();
    let lines = write_dataset(&mut buffer, &config).expect("generate");

    let mut parsed = 0u64;
    for line in buffer.split(|&b| b == b'\n').filter(|l| !l.is_empty()) {
        let record = parse_record(line).expect("generated line parses");
        assert!(!record.source.is_empty());
        assert_eq!(record.status_code, b"200");
        parsed += 1;
    }
    assert_eq!(parsed, lines);
}

#[test]
fn same_seed_regenerates_identical_bytes() {
    let config = GeneratorConfig {
        num_groups: 4,
        nodes: 10,
        out_degree: 3,
        chord_mode: ChordMode::Random,
        seed: 1234,
        ..GeneratorConfig::default()
    };
    let mut first = Vec::new();
    let mut second = Vec::new();
    write_dataset(&mut first, &config).expect("generate");
    write_dataset(&mut second, &config).expect("generate");
    assert_eq!(first, second);
}

#[test]
fn solver_finds_the_full_ring_in_generated_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("synthetic.psv");
    let config = GeneratorConfig {
        num_groups: 12,
        nodes: 7,
        out_degree: 2,
        ..GeneratorConfig::default()
    };
    write_dataset_to_path(&input, &config).expect("generate");

    let options = SolveOptions {
        num_buckets: 16,
        executor: Some(ExecutorKind::Serial),
        ..SolveOptions::default()
    };
    let summary = solve(&input, &options)
        .expect("solve")
        .expect("rings are cycles");
    assert_eq!(summary.cycle_length, 7);
    assert_eq!(summary.status_code, "200");
}

#[test]
fn plain_ring_dataset_exercises_the_functional_branch() {
    // out_degree 1 → every node has exactly one successor.
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("rings.psv");
    let config = GeneratorConfig {
        num_groups: 3,
        nodes: 50,
        out_degree: 1,
        ..GeneratorConfig::default()
    };
    write_dataset_to_path(&input, &config).expect("generate");

    let options = SolveOptions {
        num_buckets: 8,
        executor: Some(ExecutorKind::Serial),
        ..SolveOptions::default()
    };
    let summary = solve(&input, &options)
        .expect("solve")
        .expect("rings are cycles");
    assert_eq!(summary.cycle_length, 50);
}
