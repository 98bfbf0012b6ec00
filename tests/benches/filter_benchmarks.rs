//! # Cache-Shield Filter Benchmarks
//!
//! | Operation | Target |
//! |-----------|--------|
//! | `BloomFilterParams::hash` (k offsets) | < 1us |
//! | `SplitBloomFilter::hash_locations` | < 1us |
//! | sharded `add` / `might_contain` (in-memory store, one pipeline) | < 20us |
//! | sub-filter `might_contain` across 3 generations | < 60us |

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cs_cache_strategies::{
    BloomFilterParams, FilterHandler, GrowingSubFilter, InMemoryStore, ShardedBloomFilter,
    ShardedFilterHandler, SplitBloomFilter, StrategyConfig, SubFilterHandler,
};
use rand::Rng;
use tokio::runtime::Runtime;

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");

    for n in [1_000u64, 1_000_000] {
        let params = BloomFilterParams::create("bench", n, 0.01).unwrap();
        let split = SplitBloomFilter::create("bench", n, 0.01).unwrap();

        group.bench_with_input(BenchmarkId::new("hash", n), &params, |b, params| {
            b.iter(|| black_box(params.hash(black_box("item:123456"))))
        });
        group.bench_with_input(BenchmarkId::new("hash_locations", n), &split, |b, split| {
            b.iter(|| black_box(split.hash_locations(black_box("item:123456")).unwrap()))
        });
    }

    group.finish();
}

fn bench_sharded_filter(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = Arc::new(InMemoryStore::new());
    let handler = ShardedFilterHandler::new(store, &StrategyConfig::default());
    let filter = ShardedBloomFilter::create("bench-sharded", 100_000, 0.01, 4).unwrap();

    let mut group = c.benchmark_group("sharded_filter");
    group.throughput(Throughput::Elements(1));

    let mut rng = rand::thread_rng();
    group.bench_function("add", |b| {
        b.iter(|| {
            let value = rng.gen::<u64>().to_string();
            rt.block_on(handler.add(&filter, &value)).unwrap()
        })
    });
    group.bench_function("might_contain", |b| {
        b.iter(|| {
            let value = rng.gen::<u64>().to_string();
            black_box(rt.block_on(handler.might_contain(&filter, &value)).unwrap())
        })
    });

    group.finish();
}

fn bench_sub_filter(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = Arc::new(InMemoryStore::new());
    let handler = SubFilterHandler::new(store, &StrategyConfig::default());
    let chain = GrowingSubFilter::create("bench-chain", 1_000, 0.01, 4).unwrap();

    // Fill past both growth points so lookups scan every generation
    rt.block_on(async {
        for i in 0..8_000u32 {
            handler.add(&chain, &format!("seed-{}", i)).await.unwrap();
        }
    });

    let mut rng = rand::thread_rng();
    c.bench_function("sub_filter/might_contain_miss", |b| {
        b.iter(|| {
            let value = format!("probe-{}", rng.gen::<u64>());
            black_box(rt.block_on(handler.might_contain(&chain, &value)).unwrap())
        })
    });
}

criterion_group!(benches, bench_hashing, bench_sharded_filter, bench_sub_filter);
criterion_main!(benches);
