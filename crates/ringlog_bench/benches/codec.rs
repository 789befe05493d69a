//! Length indicator codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ringlog_codec::li;

const LENGTHS: [u64; 5] = [0, 200, 60_000, 1 << 30, u64::MAX];

/// Benchmark prefix and suffix encoding.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("li_encode");

    for len in LENGTHS.iter() {
        group.bench_with_input(BenchmarkId::new("prefix", len), len, |b, &len| {
            b.iter(|| black_box(li::encode_prefix(black_box(len))));
        });
        group.bench_with_input(BenchmarkId::new("suffix", len), len, |b, &len| {
            b.iter(|| black_box(li::encode_suffix(black_box(len))));
        });
    }

    group.finish();
}

/// Benchmark prefix and suffix decoding.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("li_decode");

    for len in LENGTHS.iter() {
        let prefix = li::encode_prefix(*len);
        group.bench_with_input(BenchmarkId::new("prefix", len), &prefix, |b, prefix| {
            b.iter(|| black_box(li::decode_prefix(black_box(prefix)).unwrap()));
        });

        let suffix = li::encode_suffix(*len);
        group.bench_with_input(BenchmarkId::new("suffix", len), &suffix, |b, suffix| {
            b.iter(|| black_box(li::decode_suffix(black_box(suffix)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);

criterion_main!(benches);
