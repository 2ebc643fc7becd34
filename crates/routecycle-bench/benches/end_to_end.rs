//! End-to-end solve benchmark: partition + analyze a generated dataset.
#![allow(clippy::expect_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use routecycle_bench::{GeneratorConfig, write_dataset_to_path};
use routecycle_core::{ExecutorKind, SolveOptions, solve};

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    group.sample_size(10);

    for groups in [100usize, 1000] {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("synthetic.psv");
        let config = GeneratorConfig {
            num_groups: groups,
            nodes: 8,
            out_degree: 2,
            ..GeneratorConfig::default()
        };
        write_dataset_to_path(&input, &config).expect("generate dataset");

        for (name, executor) in [
            ("serial", ExecutorKind::Serial),
            ("threads", ExecutorKind::Threads),
        ] {
            let options = SolveOptions {
                num_buckets: 256,
                executor: Some(executor),
                ..SolveOptions::default()
            };
            group.bench_with_input(
                BenchmarkId::new(name, groups),
                &options,
                |b, options| {
                    b.iter(|| {
                        let summary = solve(&input, options)
                            .expect("solve")
                            .expect("cycles exist");
                        assert_eq!(summary.cycle_length, 8);
                        summary.cycle_length
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
