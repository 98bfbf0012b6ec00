//! # Store Outages and Strategy Dispatch
//!
//! Item services for every strategy tag, driven through the registry,
//! while the key-value store goes down and comes back.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cs_cache_strategies::{
        default_item_services, CacheError, CacheMetrics, CacheStrategy, DataError,
        InMemoryItemRepository, InMemoryStore, ItemCacheService, ManualClock, StrategyConfig,
        StrategyConfigBuilder, StrategyRegistry, StrategySupport,
    };

    struct World {
        services: StrategyRegistry<dyn ItemCacheService>,
        repository: Arc<InMemoryItemRepository>,
        store: Arc<InMemoryStore>,
        metrics: Arc<CacheMetrics>,
    }

    fn world(config: StrategyConfig) -> World {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let repository = Arc::new(InMemoryItemRepository::new());
        let metrics = Arc::new(CacheMetrics::new());
        let services = default_item_services(
            repository.clone(),
            store.clone(),
            clock,
            &config,
            metrics.clone(),
        )
        .unwrap();
        World {
            services,
            repository,
            store,
            metrics,
        }
    }

    fn seeded() -> StrategyConfig {
        StrategyConfigBuilder::new().rng_seed(9).build().unwrap()
    }

    #[tokio::test]
    async fn test_reads_survive_store_outage_for_every_strategy() {
        cs_telemetry::init_test_logging();
        let w = world(seeded());

        let mut created = Vec::new();
        for strategy in CacheStrategy::ALL {
            let service = w.services.get(strategy).unwrap();
            created.push((strategy, service.create(format!("{}", strategy)).await.unwrap()));
        }

        w.store.set_available(false);
        for (strategy, item) in &created {
            let service = w.services.get(*strategy).unwrap();
            assert_eq!(
                service.read(item.item_id).await.unwrap(),
                Some(item.clone()),
                "{}",
                strategy
            );
        }

        w.store.set_available(true);
        for (strategy, item) in &created {
            let service = w.services.get(*strategy).unwrap();
            assert_eq!(service.read(item.item_id).await.unwrap(), Some(item.clone()));
        }
    }

    #[tokio::test]
    async fn test_writes_survive_store_outage() {
        let w = world(seeded());
        let service = w.services.get(CacheStrategy::Jitter).unwrap();
        let item = service.create("v1".to_string()).await.unwrap();
        service.read(item.item_id).await.unwrap();

        w.store.set_available(false);
        let updated = service.update(item.item_id, "v2".to_string()).await.unwrap();
        assert_eq!(updated.data, "v2");
        service.delete(item.item_id).await.unwrap();
        assert!(w.metrics.snapshot().fallbacks >= 2);

        // The stale entry outlived the outage; eviction on the next delete
        // clears it
        w.store.set_available(true);
        assert_eq!(
            service.read(item.item_id).await.unwrap(),
            Some(item.clone())
        );
        service.delete(item.item_id).await.unwrap();
        assert_eq!(service.read(item.item_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_penetration_guards_absorb_unknown_ids() {
        let w = world(seeded());

        for strategy in [
            CacheStrategy::NullObjectPattern,
            CacheStrategy::BloomFilter,
            CacheStrategy::SplitBloomFilter,
            CacheStrategy::SplitShardedBloomFilter,
            CacheStrategy::SplitShardedSubBloomFilter,
        ] {
            let service = w.services.get(strategy).unwrap();
            for _ in 0..20 {
                assert_eq!(service.read(10_000).await.unwrap(), None);
            }
        }

        // Only the null-object service needed one lookup to learn the
        // id is absent
        assert_eq!(w.repository.reads(), 1);
    }

    #[tokio::test]
    async fn test_unguarded_strategies_hit_repository_for_unknown_ids() {
        let w = world(seeded());

        for strategy in [
            CacheStrategy::None,
            CacheStrategy::Jitter,
            CacheStrategy::ProbabilisticEarlyRecomputation,
        ] {
            let service = w.services.get(strategy).unwrap();
            for _ in 0..5 {
                assert_eq!(service.read(10_000).await.unwrap(), None);
            }
        }

        assert_eq!(w.repository.reads(), 15);
    }

    #[tokio::test]
    async fn test_repository_failure_is_not_masked() {
        let w = world(seeded());
        w.repository.set_failing(true);

        for strategy in CacheStrategy::ALL {
            let service = w.services.get(strategy).unwrap();
            let result = service.create("x".to_string()).await;
            assert!(
                matches!(result, Err(CacheError::Source(DataError::Backend(_)))),
                "{}",
                strategy
            );
        }
        let jitter = w.services.get(CacheStrategy::Jitter).unwrap();
        assert!(matches!(
            jitter.read(1).await,
            Err(CacheError::Source(DataError::Backend(_)))
        ));
    }

    #[tokio::test]
    async fn test_textual_strategy_tags_resolve() {
        let w = world(StrategyConfig::default());

        let service = w.services.resolve("SPLIT_SHARDED_SUB_BLOOM_FILTER").unwrap();
        assert!(service.supports(CacheStrategy::SplitShardedSubBloomFilter));
        assert!(matches!(
            w.services.resolve("WRITE_BEHIND"),
            Err(CacheError::MalformedStrategy(_))
        ));
    }
}
