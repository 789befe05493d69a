//! Ring buffer benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringlog_bench::{filled_ring, random_data, random_elements};
use ringlog_core::{Queue, RingConfig, RingQueue, RingStack, Stack};
use ringlog_storage::{FileBackend, InMemoryBackend};
use tempfile::TempDir;

const RING_SIZE: u64 = 64 * 1024;

/// Benchmark appends to an in-memory queue that wraps continuously.
fn bench_memory_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_append");

    for size in [16, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let queue = filled_ring::<Queue>(RING_SIZE, size);
            let data = random_data(size);

            b.iter(|| {
                let accepted = queue.enqueue(black_box(&data)).unwrap();
                black_box(accepted);
            });
        });
    }

    group.finish();
}

/// Benchmark appends to a file-backed queue.
fn bench_file_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_append");

    // Use larger sample size for file operations
    group.sample_size(50);

    for size in [256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let backend = FileBackend::open(&temp_dir.path().join("bench.ring")).unwrap();
            let queue =
                RingQueue::open(backend, RingConfig::new().max_size(RING_SIZE)).unwrap();
            let data = random_data(size);

            b.iter(|| {
                queue.enqueue(black_box(&data)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark the cost of syncing every protocol step.
fn bench_synced_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("synced_append");
    group.sample_size(20); // Sync is slow

    let temp_dir = TempDir::new().unwrap();
    let backend = FileBackend::open(&temp_dir.path().join("bench.ring")).unwrap();
    let config = RingConfig::new().max_size(RING_SIZE).sync_on_commit(true);
    let queue = RingQueue::open(backend, config).unwrap();
    let data = random_data(256);

    group.bench_function("256b", |b| {
        b.iter(|| {
            queue.enqueue(black_box(&data)).unwrap();
        });
    });

    group.finish();
}

/// Benchmark a full forward and reverse pass over a wrapped ring.
fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration");

    let queue = filled_ring::<Queue>(RING_SIZE, 64);
    group.bench_function("forward_64b", |b| {
        b.iter(|| {
            let count = queue.iter().unwrap().map(|e| e.unwrap().len()).sum::<usize>();
            black_box(count);
        });
    });

    group.bench_function("len_64b", |b| {
        b.iter(|| black_box(queue.len().unwrap()));
    });

    let stack = filled_ring::<Stack>(RING_SIZE, 64);
    group.bench_function("reverse_64b", |b| {
        b.iter(|| {
            let count = stack.reverse_iter().unwrap().map(|e| e.unwrap().len()).sum::<usize>();
            black_box(count);
        });
    });

    group.finish();
}

/// Benchmark mixed push/pop/dequeue traffic on a stack.
fn bench_mixed_ends(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_ends");
    group.sample_size(20);

    let elements = random_elements(1000, 200);
    group.bench_function("stack_1000_ops", |b| {
        b.iter(|| {
            let stack =
                RingStack::open(InMemoryBackend::new(), RingConfig::new().max_size(8 * 1024))
                    .unwrap();
            for (i, element) in elements.iter().enumerate() {
                stack.push(element).unwrap();
                match i % 5 {
                    0 => {
                        black_box(stack.pop().unwrap());
                    }
                    1 => {
                        black_box(stack.dequeue().unwrap());
                    }
                    _ => {}
                }
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_memory_append,
    bench_file_append,
    bench_synced_append,
    bench_iteration,
    bench_mixed_ends,
);

criterion_main!(benches);
