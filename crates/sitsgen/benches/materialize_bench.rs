//! Benchmarks for pixel materialization and chunked fitting.
//!
//! Run with: cargo bench --bench materialize_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array3, Array4};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use sitsgen::prelude::*;

/// Create `n_batches` synthetic series of `horizon` frames.
fn create_synthetic_batches(n_batches: usize, horizon: usize, size: usize, channels: usize) -> Vec<FrameBatch> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..n_batches)
        .map(|_| {
            let frames = Array4::from_shape_fn((horizon, size, size, channels), |_| rng.gen::<f32>());
            let annotations = Array3::from_shape_fn((horizon, size, size), |_| rng.gen_range(0..5i64));
            FrameBatch { frames, annotations }
        })
        .collect()
}

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");

    for n_batches in [4, 16, 64].iter() {
        let batches = create_synthetic_batches(*n_batches, 12, 32, 4);

        group.bench_with_input(BenchmarkId::new("series_32x32", n_batches), n_batches, |b, _| {
            b.iter(|| {
                let arrays = materialize(black_box(&batches), Seed::new(0)).unwrap();
                black_box(arrays.len())
            })
        });
    }

    group.finish();
}

fn bench_chunked_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked_fit");
    group.sample_size(10);

    let batches = create_synthetic_batches(8, 6, 16, 3);
    let arrays = materialize(&batches, Seed::new(0)).unwrap();

    for n_chunks in [1, 4, 16].iter() {
        let config = ReferenceClassifierConfig {
            n_chunks: *n_chunks,
            tol: 1e-2,
            max_iter: 20,
            ..ReferenceClassifierConfig::default()
        };

        group.bench_with_input(BenchmarkId::new("n_chunks", n_chunks), n_chunks, |b, _| {
            b.iter(|| {
                let fit = fit_by_chunks(arrays.features.view(), arrays.labels.view(), &config, 1).unwrap();
                black_box(fit.outcomes.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_materialize, bench_chunked_fit);
criterion_main!(benches);
