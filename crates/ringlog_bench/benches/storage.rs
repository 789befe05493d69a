//! Storage backend benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringlog_bench::random_data;
use ringlog_storage::{FileBackend, InMemoryBackend, StorageBackend};
use tempfile::TempDir;

/// Benchmark positional overwrites, the ring's steady-state write pattern.
fn bench_inmemory_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_write_at");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut backend = InMemoryBackend::with_data(vec![0; 64 * 1024]);
            let data = random_data(size);
            let mut offset = 0u64;

            b.iter(|| {
                backend.write_at(black_box(offset), &[&data]).unwrap();
                offset = (offset + size as u64) % (60 * 1024);
            });
        });
    }

    group.finish();
}

/// Benchmark InMemoryBackend read operations.
fn bench_inmemory_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_read");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let backend = InMemoryBackend::with_data(random_data(size));

            b.iter(|| {
                let result = backend.read_at(black_box(0), black_box(size)).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

/// Benchmark FileBackend positional writes split into prefix, payload and suffix.
fn bench_file_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_write_at");

    // Use larger sample size for file operations
    group.sample_size(50);

    for size in [256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let mut backend = FileBackend::open(&temp_dir.path().join("bench.dat")).unwrap();
            let data = random_data(size);

            b.iter(|| {
                backend.write_at(black_box(0), &[&[2, 1, 0], &data, &[0, 1, 2]]).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark the header-sized write plus sync of a commit step.
fn bench_file_header_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_header_sync");
    group.sample_size(20); // Sync is slow

    let temp_dir = TempDir::new().unwrap();
    let mut backend = FileBackend::open(&temp_dir.path().join("bench.dat")).unwrap();
    let header = [0xabu8; 32];

    group.bench_function("32b", |b| {
        b.iter(|| {
            backend.write_at(0, &[&header]).unwrap();
            backend.sync().unwrap();
        });
    });

    group.finish();
}

/// Benchmark tail truncation as done on wraparound.
fn bench_truncate(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncate");
    group.sample_size(20);

    group.bench_function("inmemory_64k_to_32k", |b| {
        let data = random_data(64 * 1024);
        b.iter(|| {
            let mut backend = InMemoryBackend::with_data(data.clone());
            backend.truncate(black_box(32 * 1024)).unwrap();
            black_box(backend.size().unwrap());
        });
    });

    group.bench_function("file_64k_to_32k", |b| {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = FileBackend::open(&temp_dir.path().join("bench.dat")).unwrap();
        let data = random_data(64 * 1024);
        b.iter(|| {
            backend.replace(&data).unwrap();
            backend.truncate(black_box(32 * 1024)).unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_inmemory_write,
    bench_inmemory_read,
    bench_file_write,
    bench_file_header_sync,
    bench_truncate,
);

criterion_main!(benches);
