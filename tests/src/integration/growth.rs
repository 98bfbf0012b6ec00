//! # Sub-Filter Growth
//!
//! Capacity-triggered growth under concurrent writers, growth blocked and
//! resumed around the lease lock, and the generation limit.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use cs_cache_strategies::{
        CacheMetrics, DistributedLockProvider, FilterHandler, GrowingSubFilter, InMemoryStore,
        KeyValueStore, ManualClock, StrategyConfigBuilder, SubFilterHandler,
    };

    const P: f64 = 0.01;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_grow_to_the_limit_exactly_once_per_generation() {
        cs_telemetry::init_test_logging();
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(CacheMetrics::new());
        let config = StrategyConfigBuilder::new().build().unwrap();
        let handler =
            Arc::new(SubFilterHandler::new(store.clone(), &config).with_metrics(metrics.clone()));
        let chain =
            Arc::new(GrowingSubFilter::with_limits("concurrent", 50, P, 2, 2, 256).unwrap());
        handler.init(&chain).await.unwrap();

        // 400 inserts: generation 0 overshoots while growth is in flight,
        // generation 1 still receives well over its capacity of 100
        let mut tasks = Vec::new();
        for writer in 0..16u32 {
            let handler = handler.clone();
            let chain = chain.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..25u32 {
                    let value = format!("w{}-{}", writer, i);
                    handler.add(&chain, &value).await.unwrap();
                }
            }));
        }
        for task in futures::future::join_all(tasks).await {
            task.unwrap();
        }

        assert_eq!(handler.generation_count(&chain).await.unwrap(), 2);
        assert_eq!(metrics.snapshot().generations_created, 2);
        for writer in 0..16u32 {
            for i in 0..25u32 {
                let value = format!("w{}-{}", writer, i);
                assert!(handler.might_contain(&chain, &value).await.unwrap());
            }
        }
        // Lock released after every growth
        assert_eq!(
            store.get(&SubFilterHandler::lock_key(&chain)).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_held_lock_defers_growth_until_lease_expires() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let config = StrategyConfigBuilder::new()
            .lock_lease(Duration::from_secs(5))
            .build()
            .unwrap();
        let handler = SubFilterHandler::new(store.clone(), &config);
        let chain = GrowingSubFilter::with_limits("leased", 20, P, 2, 2, 256).unwrap();

        // Another process holds the growth lock and never releases it
        let other = DistributedLockProvider::new(store.clone());
        assert!(other
            .lock(&SubFilterHandler::lock_key(&chain), Duration::from_secs(60))
            .await
            .unwrap());

        for i in 0..20 {
            handler.add(&chain, &format!("v{}", i)).await.unwrap();
        }
        assert_eq!(handler.generation_count(&chain).await.unwrap(), 0);

        clock.advance(Duration::from_secs(60));
        handler.add(&chain, "after-lease").await.unwrap();
        assert_eq!(handler.generation_count(&chain).await.unwrap(), 1);

        for i in 0..20 {
            assert!(handler.might_contain(&chain, &format!("v{}", i)).await.unwrap());
        }
        assert!(handler.might_contain(&chain, "after-lease").await.unwrap());
    }

    #[tokio::test]
    async fn test_saturated_chain_keeps_accepting_inserts() {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(CacheMetrics::new());
        let config = StrategyConfigBuilder::new().max_generations(1).build().unwrap();
        let handler = SubFilterHandler::new(store.clone(), &config).with_metrics(metrics.clone());
        let chain = GrowingSubFilter::with_limits("saturated", 10, P, 1, 1, 256).unwrap();

        // Capacity 10 + 20, then 30 more past the limit
        for i in 0..60 {
            handler.add(&chain, &format!("v{}", i)).await.unwrap();
        }

        assert_eq!(handler.generation_count(&chain).await.unwrap(), 1);
        assert_eq!(metrics.snapshot().generations_created, 1);
        assert_eq!(metrics.snapshot().growth_limits_reached, 1);
        for i in 0..60 {
            assert!(handler.might_contain(&chain, &format!("v{}", i)).await.unwrap());
        }
        let overfilled = store
            .get(&SubFilterHandler::data_count_key(chain.active(1)))
            .await
            .unwrap();
        assert_eq!(overfilled.as_deref(), Some("50"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lock_admits_one_holder_under_contention() {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(CacheMetrics::new());
        let locks =
            Arc::new(DistributedLockProvider::new(store.clone()).with_metrics(metrics.clone()));

        let mut tasks = Vec::new();
        for _ in 0..64 {
            let locks = locks.clone();
            tasks.push(tokio::spawn(async move {
                locks
                    .lock("contended", Duration::from_secs(30))
                    .await
                    .unwrap()
            }));
        }
        let winners = futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter(|won| *won.as_ref().unwrap())
            .count();

        assert_eq!(winners, 1);
        assert_eq!(metrics.snapshot().lock_contentions, 63);
    }
}
