//! # Membership Across Filter Layouts
//!
//! Plain, split, sharded and growing filters over one shared store:
//! no false negatives, false-positive rate near target, and `delete`
//! leaving no keys behind.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cs_cache_strategies::{
        BloomFilterHandler, BloomFilterParams, FilterHandler, GrowingSubFilter, InMemoryStore,
        KeyValueStore, ShardedBloomFilter, ShardedFilterHandler, SplitBloomFilter,
        SplitFilterHandler, StrategyConfig, StrategyConfigBuilder, SubFilterHandler,
    };

    const N: u64 = 1000;
    const P: f64 = 0.01;

    fn config() -> StrategyConfig {
        StrategyConfigBuilder::new()
            .split_unit_bits(1024)
            .init_chunk_bits(4096)
            .build()
            .expect("valid config")
    }

    fn member(i: u64) -> String {
        format!("member-{}", i)
    }

    fn stranger(i: u64) -> String {
        format!("stranger-{}", i)
    }

    async fn false_positives<H: FilterHandler>(handler: &H, filter: &H::Filter) -> u64 {
        let mut hits = 0;
        for i in 0..10_000 {
            if handler.might_contain(filter, &stranger(i)).await.unwrap() {
                hits += 1;
            }
        }
        hits
    }

    #[tokio::test]
    async fn test_every_layout_has_no_false_negatives() {
        cs_telemetry::init_test_logging();
        let store = Arc::new(InMemoryStore::new());
        let config = config();

        let bloom = BloomFilterHandler::new(store.clone(), &config);
        let bloom_filter = BloomFilterParams::create("layouts", N, P).unwrap();
        let split = SplitFilterHandler::new(store.clone(), &config);
        let split_filter = SplitBloomFilter::with_split_unit("layouts", N, P, 1024).unwrap();
        let sharded = ShardedFilterHandler::new(store.clone(), &config);
        let sharded_filter =
            ShardedBloomFilter::with_split_unit("layouts-sharded", N, P, 4, 1024).unwrap();

        for i in 0..N {
            bloom.add(&bloom_filter, &member(i)).await.unwrap();
            split.add(&split_filter, &member(i)).await.unwrap();
            sharded.add(&sharded_filter, &member(i)).await.unwrap();
        }

        for i in 0..N {
            assert!(bloom.might_contain(&bloom_filter, &member(i)).await.unwrap());
            assert!(split.might_contain(&split_filter, &member(i)).await.unwrap());
            assert!(sharded
                .might_contain(&sharded_filter, &member(i))
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn test_false_positive_rate_near_target_at_capacity() {
        let store = Arc::new(InMemoryStore::new());
        let config = config();
        let split = SplitFilterHandler::new(store.clone(), &config);
        let split_filter = SplitBloomFilter::with_split_unit("fpr-split", N, P, 1024).unwrap();
        let sharded = ShardedFilterHandler::new(store.clone(), &config);
        let sharded_filter =
            ShardedBloomFilter::with_split_unit("fpr-sharded", N, P, 4, 1024).unwrap();

        for i in 0..N {
            split.add(&split_filter, &member(i)).await.unwrap();
            sharded.add(&sharded_filter, &member(i)).await.unwrap();
        }

        // 1% target; 3x headroom for hash variance over 10k probes
        assert!(false_positives(&split, &split_filter).await < 300);
        assert!(false_positives(&sharded, &sharded_filter).await < 300);
    }

    #[tokio::test]
    async fn test_split_and_plain_layouts_use_the_same_bits() {
        let store = Arc::new(InMemoryStore::new());
        let config = config();
        let bloom = BloomFilterHandler::new(store.clone(), &config);
        let bloom_filter = BloomFilterParams::create("same-bits", N, P).unwrap();
        let split = SplitFilterHandler::new(store.clone(), &config);
        let split_filter = SplitBloomFilter::with_split_unit("same-bits", N, P, 1024).unwrap();

        bloom.add(&bloom_filter, "x").await.unwrap();
        split.add(&split_filter, "x").await.unwrap();

        let mut plain = bloom_filter.hash("x");
        plain.sort_unstable();
        plain.dedup();
        let mut located: Vec<u64> = split_filter
            .hash_locations("x")
            .unwrap()
            .into_iter()
            .map(|loc| loc.split_index * 1024 + loc.local_offset)
            .collect();
        located.sort_unstable();
        located.dedup();
        assert_eq!(plain, located);

        let bloom_key = BloomFilterHandler::key(&bloom_filter);
        for offset in plain {
            assert!(store.get_bit(&bloom_key, offset).await.unwrap());
        }
        for loc in split_filter.hash_locations("x").unwrap() {
            let key = SplitFilterHandler::key(&split_filter, loc.split_index);
            assert!(store.get_bit(&key, loc.local_offset).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_growing_chain_keeps_every_generation_visible() {
        let store = Arc::new(InMemoryStore::new());
        let config = config();
        let handler = SubFilterHandler::new(store.clone(), &config);
        let chain = GrowingSubFilter::with_limits("visible", 50, P, 2, 2, 256).unwrap();
        handler.init(&chain).await.unwrap();

        // 50 fill generation 0, 100 fill generation 1, 25 land in generation 2
        for i in 0..175 {
            handler.add(&chain, &member(i)).await.unwrap();
        }

        assert_eq!(handler.generation_count(&chain).await.unwrap(), 2);
        for i in 0..175 {
            assert!(
                handler.might_contain(&chain, &member(i)).await.unwrap(),
                "member {} lost",
                i
            );
        }
    }

    #[tokio::test]
    async fn test_init_add_delete_leaves_no_keys() {
        let store = Arc::new(InMemoryStore::new());
        let config = config();

        let bloom = BloomFilterHandler::new(store.clone(), &config);
        let bloom_filter = BloomFilterParams::create("cleanup", N, P).unwrap();
        let sharded = ShardedFilterHandler::new(store.clone(), &config);
        let sharded_filter =
            ShardedBloomFilter::with_split_unit("cleanup", N, P, 4, 1024).unwrap();
        let sub = SubFilterHandler::new(store.clone(), &config);
        let chain = GrowingSubFilter::with_limits("cleanup-chain", 20, P, 2, 2, 256).unwrap();

        bloom.init(&bloom_filter).await.unwrap();
        sharded.init(&sharded_filter).await.unwrap();
        sub.init(&chain).await.unwrap();
        for i in 0..100 {
            bloom.add(&bloom_filter, &member(i)).await.unwrap();
            sharded.add(&sharded_filter, &member(i)).await.unwrap();
            sub.add(&chain, &member(i)).await.unwrap();
        }
        assert!(!store.keys_with_prefix("").is_empty());

        bloom.delete(&bloom_filter).await.unwrap();
        sharded.delete(&sharded_filter).await.unwrap();
        sub.delete(&chain).await.unwrap();

        assert!(store.keys_with_prefix("").is_empty());
    }
}
