//! # Stampede Mitigation
//!
//! Keys cached together under jitter expire spread across the window;
//! a steadily read PER entry is refreshed ahead of expiry instead of
//! missing at it.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use cs_cache_strategies::testing::CountingSource;
    use cs_cache_strategies::{
        CacheHandler, CacheMetrics, InMemoryStore, JitterCacheHandler, KeyValueStore, ManualClock,
        PerCacheHandler, StrategyConfigBuilder,
    };

    const TTL: Duration = Duration::from_secs(10);
    const READ_INTERVAL: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn test_jitter_spreads_expiry_of_keys_cached_together() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let config = StrategyConfigBuilder::new().rng_seed(11).build().unwrap();
        let handler = JitterCacheHandler::new(store.clone(), &config);

        for i in 0..200 {
            handler
                .put(&format!("hot:{}", i), TTL, &i)
                .await
                .unwrap();
        }

        // TTLs fall in 7..=13 s; at 10 s some keys are gone and some remain
        clock.advance(TTL);
        let alive = store.keys_with_prefix("hot:").len();
        assert!(alive > 0 && alive < 200, "alive = {}", alive);

        clock.advance(Duration::from_secs(3));
        assert!(store.keys_with_prefix("hot:").is_empty());
    }

    #[tokio::test]
    async fn test_jitter_window_covers_both_sides_of_ttl() {
        let store = Arc::new(InMemoryStore::new());
        let config = StrategyConfigBuilder::new().rng_seed(5).build().unwrap();
        let handler = JitterCacheHandler::new(store.clone(), &config);

        let mut seen = std::collections::BTreeSet::new();
        for i in 0..200 {
            let key = format!("k{}", i);
            handler.put(&key, TTL, &"v".to_string()).await.unwrap();
            let ttl = store.get_expire(&key).await.unwrap().unwrap();
            // Wall clock may tick between set and read
            seen.insert((ttl.as_millis() as u64 + 999) / 1000);
        }

        assert!(seen.iter().all(|s| (7..=13).contains(s)), "{:?}", seen);
        assert!(seen.iter().any(|s| *s < 10));
        assert!(seen.iter().any(|s| *s > 10));
    }

    #[tokio::test]
    async fn test_per_refreshes_steadily_read_entry_before_expiry() {
        cs_telemetry::init_test_logging();
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let metrics = Arc::new(CacheMetrics::new());
        let config = StrategyConfigBuilder::new().rng_seed(2024).build().unwrap();
        let handler = PerCacheHandler::new(store.clone(), clock.clone(), &config)
            .with_metrics(metrics.clone());
        let source = CountingSource::ok("report".to_string())
            .with_cost(clock.clone(), Duration::from_secs(1));
        let load = source.as_source();

        // 30 s of reads every 100 ms against a 10 s TTL and a 1 s recompute
        for _ in 0..300 {
            let value = handler.fetch("report", TTL, &*load).await.unwrap();
            assert_eq!(value, "report");
            clock.advance(READ_INTERVAL);
        }

        let snapshot = metrics.snapshot();
        // Only the cold start misses; every later recompute happened early
        assert_eq!(snapshot.misses, 1);
        assert!(snapshot.early_refreshes >= 2);
        assert_eq!(source.calls() as u64, 1 + snapshot.early_refreshes);
    }

    #[tokio::test]
    async fn test_jitter_entry_misses_at_expiry_under_the_same_load() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let metrics = Arc::new(CacheMetrics::new());
        let config = StrategyConfigBuilder::new().rng_seed(2024).build().unwrap();
        let handler = JitterCacheHandler::new(store.clone(), &config).with_metrics(metrics.clone());
        let source = CountingSource::ok("report".to_string());
        let load = source.as_source();

        for _ in 0..300 {
            handler.fetch("report", TTL, &*load).await.unwrap();
            clock.advance(READ_INTERVAL);
        }

        // Expiry at 13 s at the latest forces at least two reloads in 30 s
        assert!(metrics.snapshot().misses >= 3);
        assert_eq!(source.calls() as u64, metrics.snapshot().misses);
    }

    #[tokio::test]
    async fn test_per_cold_entry_is_computed_once_then_served() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let config = StrategyConfigBuilder::new().rng_seed(1).build().unwrap();
        let handler = PerCacheHandler::new(store.clone(), clock.clone(), &config);
        let source = CountingSource::ok(vec![1u32, 2, 3])
            .with_cost(clock.clone(), Duration::from_millis(10));
        let load = source.as_source();

        for _ in 0..50 {
            assert_eq!(
                handler.fetch("list", TTL, &*load).await.unwrap(),
                vec![1, 2, 3]
            );
        }
        assert_eq!(source.calls(), 1);
        assert!(CacheHandler::<Vec<u32>>::evict(&handler, "list").await.is_ok());
        assert_eq!(store.get("list").await.unwrap(), None);
    }
}
