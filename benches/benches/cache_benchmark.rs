//! Cache tier benchmarks.
//!
//! Run with: `cargo bench --package candlekeep-bench --bench cache_benchmark`

use candlekeep_bench::{keys, random_walk};
use candlekeep_cache::{MemoryTier, PersistentTier};
use candlekeep_types::Timeframe;
use chrono::TimeDelta;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tempfile::TempDir;

fn memory_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_tier");
    let series = Arc::new(random_walk("EURUSD", Timeframe::H1, 500));
    let ttl = TimeDelta::hours(2);

    for capacity in [64, 1_024] {
        let tier = MemoryTier::new(NonZeroUsize::new(capacity).unwrap());
        let hot = keys(Timeframe::H1, capacity);
        for key in &hot {
            tier.put(key.clone(), Arc::clone(&series), ttl);
        }

        group.bench_with_input(BenchmarkId::new("get_hit", capacity), &hot, |b, hot| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % hot.len();
                black_box(tier.get(&hot[i]))
            });
        });

        // Twice the capacity of distinct keys: every put evicts.
        let churn = keys(Timeframe::M5, capacity * 2);
        group.bench_with_input(BenchmarkId::new("put_evict", capacity), &churn, |b, churn| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % churn.len();
                tier.put(churn[i].clone(), Arc::clone(&series), ttl);
            });
        });
    }
    group.finish();
}

fn persistent_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistent_tier");
    group.sample_size(20);
    let dir = TempDir::new().unwrap();
    let tier = PersistentTier::new(dir.path()).unwrap();
    let ttl = TimeDelta::hours(2);

    for size in [100, 2_000] {
        let series = Arc::new(random_walk("EURUSD", Timeframe::M1, size));
        let key = keys(Timeframe::M1, 1).remove(0);

        group.bench_with_input(BenchmarkId::new("put", size), &series, |b, series| {
            b.iter(|| tier.put(&key, Arc::clone(series), ttl).unwrap());
        });
        tier.put(&key, Arc::clone(&series), ttl).unwrap();
        group.bench_with_input(BenchmarkId::new("get", size), &key, |b, key| {
            b.iter(|| black_box(tier.get(key)));
        });
    }
    group.finish();
}

criterion_group!(benches, memory_benchmark, persistent_benchmark);
criterion_main!(benches);
