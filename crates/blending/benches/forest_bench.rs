//! Criterion benchmarks for the Random Rain Forest.
//!
//! Benchmarks:
//!   - fit on 60 points (one full predictor history), 8 and 12 trees
//!   - predict on a trained 8-tree forest
//!   - Storm Guard detect over 60 points
//!
//! Run with: cargo bench -p blending --bench forest_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use blending::analytics::{RandomRainForest, StormGuard};

fn history_series(n: usize) -> (Vec<f64>, Vec<f64>) {
    let x: Vec<f64> = (0..n).map(|i| i as f64 * 2.0).collect();
    let y: Vec<f64> = (0..n)
        .map(|i| 220.0 + 0.8 * i as f64 + [1.0, -2.0, 0.5, 1.5, -1.0][i % 5])
        .collect();
    (x, y)
}

// ---------------------------------------------------------------------------
// Benchmark: fit
// ---------------------------------------------------------------------------

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest_fit");
    let (x, y) = history_series(60);

    for num_trees in [8usize, 12] {
        group.bench_with_input(BenchmarkId::from_parameter(num_trees), &num_trees, |b, &n| {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            b.iter(|| {
                let mut forest = RandomRainForest::new(n, 3);
                forest.fit(black_box(&x), black_box(&y), &mut rng);
                forest
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: predict / Storm Guard
// ---------------------------------------------------------------------------

fn bench_predict(c: &mut Criterion) {
    let (x, y) = history_series(60);
    let mut forest = RandomRainForest::default();
    forest.fit(&x, &y, &mut ChaCha8Rng::seed_from_u64(2));

    c.bench_function("forest_predict", |b| {
        b.iter(|| black_box(forest.predict(black_box(178.0))));
    });

    let guard = StormGuard::default();
    c.bench_function("storm_guard_detect_60", |b| {
        b.iter(|| black_box(guard.detect(black_box(&y))));
    });
}

criterion_group!(benches, bench_fit, bench_predict);
criterion_main!(benches);
