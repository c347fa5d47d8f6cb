//! Benchmark suite for the discrepancy prober
//!
//! Measures the two passes and the full comparison over growing outer
//! bounds. A capture sink keeps the diagnostic lines out of criterion's
//! output; the formatting work still runs, matching what a real run pays.

use comprobar::{
    compare_collections, parallel_pass, run_comparison, sequential_pass, DiagnosticSink,
    ProbeConfig,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const OUTER_LENS: [usize; 3] = [2, 64, 512];

fn benchmark_sequential_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_pass");
    for outer_len in OUTER_LENS.iter() {
        let config = ProbeConfig::with_outer_len(*outer_len).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(outer_len),
            &config,
            |b, config| {
                let sink = DiagnosticSink::capture();
                b.iter(|| black_box(sequential_pass(black_box(config), &sink)));
            },
        );
    }
    group.finish();
}

fn benchmark_parallel_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_pass");
    for outer_len in OUTER_LENS.iter() {
        let config = ProbeConfig::with_outer_len(*outer_len).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(outer_len),
            &config,
            |b, config| {
                let sink = DiagnosticSink::capture();
                b.iter(|| black_box(parallel_pass(black_box(config), &sink).unwrap()));
            },
        );
    }
    group.finish();
}

fn benchmark_compare_collections(c: &mut Criterion) {
    let config = ProbeConfig::with_outer_len(512).unwrap();
    let sink = DiagnosticSink::capture();
    let sequential = sequential_pass(&config, &sink);
    let parallel = parallel_pass(&config, &sink).unwrap();

    c.bench_function("compare_collections_512", |b| {
        b.iter(|| {
            let (shape_equal, checked, mismatches) =
                compare_collections(black_box(&sequential), black_box(&parallel));
            black_box((shape_equal, checked, mismatches))
        });
    });
}

fn benchmark_run_comparison(c: &mut Criterion) {
    c.bench_function("run_comparison_default", |b| {
        let config = ProbeConfig::default();
        b.iter(|| {
            let sink = DiagnosticSink::capture();
            black_box(run_comparison(black_box(&config), &sink).unwrap())
        });
    });
}

criterion_group!(
    benches,
    benchmark_sequential_pass,
    benchmark_parallel_pass,
    benchmark_compare_collections,
    benchmark_run_comparison,
);
criterion_main!(benches);
