//! Criterion micro-benchmarks for mask composition and evaluation.

use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::Slice;
use specube_bench::{reference_cube, reference_wcs, REFERENCE_SHAPE};
use specube_mask::{LazyMask, Mask, View};
use specube_test_utils::random_mask;

/// Benchmark: Evaluate one boolean mask over the full reference cube.
fn bench_include_boolean(c: &mut Criterion) {
    let cube = reference_cube(42)
        .with_mask(random_mask(1, &REFERENCE_SHAPE, 0.2), true)
        .unwrap();

    c.bench_function("include_boolean_1m", |b| {
        b.iter(|| {
            let include = cube.include(&View::all()).unwrap();
            std::hint::black_box(&include);
        });
    });
}

/// Benchmark: Evaluate an inherited chain of 8 boolean masks plus a finite mask.
fn bench_include_chain_8(c: &mut Criterion) {
    let base = reference_cube(42);
    let finite = LazyMask::finite(base.data().clone(), reference_wcs());
    let mut cube = base.with_mask(finite, true).unwrap();
    for seed in 0..8 {
        cube = cube
            .with_mask(random_mask(seed, &REFERENCE_SHAPE, 0.05), true)
            .unwrap();
    }

    c.bench_function("include_chain_8", |b| {
        b.iter(|| {
            let include = cube.include(&View::all()).unwrap();
            std::hint::black_box(&include);
        });
    });
}

/// Benchmark: Evaluate the same chain over a single-channel view.
fn bench_include_chain_view(c: &mut Criterion) {
    let mut cube = reference_cube(42);
    for seed in 0..8 {
        cube = cube
            .with_mask(random_mask(seed, &REFERENCE_SHAPE, 0.05), true)
            .unwrap();
    }
    let view = View::new([Slice::from(10..11), Slice::from(..), Slice::from(..)]);

    c.bench_function("include_chain_8_one_channel", |b| {
        b.iter(|| {
            let include = cube.include(&view).unwrap();
            std::hint::black_box(&include);
        });
    });
}

/// Benchmark: Build a 64-deep composite without evaluating it.
fn bench_compose_64(c: &mut Criterion) {
    let cube = reference_cube(42);
    let leaf: Mask = LazyMask::finite(cube.data().clone(), reference_wcs()).into();

    c.bench_function("compose_64", |b| {
        b.iter(|| {
            let mut mask = leaf.clone();
            for _ in 0..64 {
                mask = mask.and(&leaf).unwrap();
            }
            std::hint::black_box(&mask);
        });
    });
}

/// Benchmark: Fill masked samples of the full reference cube.
fn bench_filled_data(c: &mut Criterion) {
    let cube = reference_cube(42)
        .with_mask(random_mask(1, &REFERENCE_SHAPE, 0.5), true)
        .unwrap()
        .with_fill_value(0.0);

    c.bench_function("filled_data_1m", |b| {
        b.iter(|| {
            let filled = cube.filled_data(&View::all()).unwrap();
            std::hint::black_box(&filled);
        });
    });
}

criterion_group!(
    benches,
    bench_include_boolean,
    bench_include_chain_8,
    bench_include_chain_view,
    bench_compose_64,
    bench_filled_data
);
criterion_main!(benches);
