//! Time-series engine benchmarks.
//!
//! Run with: `cargo bench --package candlekeep-bench --bench engine_benchmark`

use candlekeep_bench::random_walk;
use candlekeep_transform::{
    VolatilityMethod, forward_fill, resample, rolling_windows, summary_statistics, volatility,
};
use candlekeep_types::Timeframe;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

const SIZES: [usize; 3] = [1_440, 10_080, 43_200];

fn resample_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    for size in SIZES {
        let series = random_walk("EURUSD", Timeframe::M1, size);
        group.throughput(Throughput::Elements(size as u64));
        for target in [Timeframe::M5, Timeframe::H1, Timeframe::D1] {
            group.bench_with_input(
                BenchmarkId::new(target.as_str(), size),
                &series,
                |b, series| b.iter(|| resample(black_box(series), target)),
            );
        }
    }
    group.finish();
}

fn analytics_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("analytics");
    for size in SIZES {
        let series = random_walk("EURUSD", Timeframe::M1, size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("stddev_20", size), &series, |b, s| {
            b.iter(|| volatility(black_box(s), 20, VolatilityMethod::StdDev));
        });
        group.bench_with_input(BenchmarkId::new("atr_14", size), &series, |b, s| {
            b.iter(|| volatility(black_box(s), 14, VolatilityMethod::Atr));
        });
        group.bench_with_input(BenchmarkId::new("summary", size), &series, |b, s| {
            b.iter(|| summary_statistics(black_box(s)));
        });
        group.bench_with_input(BenchmarkId::new("windows_60", size), &series, |b, s| {
            b.iter(|| rolling_windows(black_box(s), 60, 1).iter().map(<[_]>::len).sum::<usize>());
        });
        group.bench_with_input(BenchmarkId::new("forward_fill", size), &series, |b, s| {
            b.iter(|| forward_fill(black_box(s), 5));
        });
    }
    group.finish();
}

criterion_group!(benches, resample_benchmark, analytics_benchmark);
criterion_main!(benches);
