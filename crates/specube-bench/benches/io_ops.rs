//! Criterion micro-benchmarks for the native file format.

use criterion::{criterion_group, criterion_main, Criterion};
use specube_bench::{reference_cube, REFERENCE_SHAPE};
use specube_io::{read, ReadOptions, WriteCube, WriteOptions};
use specube_test_utils::random_mask;

/// Benchmark: Write a masked reference cube, replacing the previous file.
fn bench_native_write(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.cube.json");
    let cube = reference_cube(42)
        .with_mask(random_mask(1, &REFERENCE_SHAPE, 0.2), true)
        .unwrap();
    let options = WriteOptions::overwriting();

    c.bench_function("native_write_1m", |b| {
        b.iter(|| cube.write(&path, &options).unwrap());
    });
}

/// Benchmark: Read back a masked reference cube.
fn bench_native_read(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.cube.json");
    reference_cube(42)
        .with_mask(random_mask(1, &REFERENCE_SHAPE, 0.2), true)
        .unwrap()
        .write(&path, &WriteOptions::default())
        .unwrap();
    let options = ReadOptions::default();

    c.bench_function("native_read_1m", |b| {
        b.iter(|| {
            let loaded = read(&path, &options).unwrap();
            std::hint::black_box(&loaded);
        });
    });
}

criterion_group!(benches, bench_native_write, bench_native_read);
criterion_main!(benches);
