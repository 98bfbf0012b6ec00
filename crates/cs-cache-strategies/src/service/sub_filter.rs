//! Growing sub-filter chain handler
//!
//! Inserts go to the active generation. When that generation's insert
//! counter reaches its designed capacity, one writer appends the next
//! generation under the chain's growth lock.
//!
//! Store keys:
//! - `sub-bloom-filter:generation-count:{id}`: generations appended so far
//! - `sub-bloom-filter:generation-count:{id}:lock`: growth lock
//! - `sub-bloom-filter:data-count:{generation id}`: inserts per generation
//!
//! The insert counter is approximate under concurrency; overshooting the
//! boundary is tolerated. At most one writer grows the chain from a given
//! generation count: the lock serializes growth and the count is re-read
//! after acquisition.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::lock::DistributedLockProvider;
use super::sharded_filter::ShardedFilterHandler;
use crate::domain::{GrowingSubFilter, ShardedBloomFilter, StrategyConfig};
use crate::error::{FilterError, StoreError};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{FilterHandler, KeyValueStore};

pub struct SubFilterHandler {
    store: Arc<dyn KeyValueStore>,
    sharded: ShardedFilterHandler,
    locks: DistributedLockProvider,
    lock_lease: Duration,
    metrics: Arc<dyn MetricsRecorder>,
}

impl SubFilterHandler {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &StrategyConfig) -> Self {
        Self {
            sharded: ShardedFilterHandler::new(store.clone(), config),
            locks: DistributedLockProvider::new(store.clone()),
            store,
            lock_lease: config.lock_lease,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.locks = self.locks.with_metrics(metrics.clone());
        self.metrics = metrics;
        self
    }

    pub fn generation_count_key(chain: &GrowingSubFilter) -> String {
        format!("sub-bloom-filter:generation-count:{}", chain.id())
    }

    pub fn lock_key(chain: &GrowingSubFilter) -> String {
        format!("{}:lock", Self::generation_count_key(chain))
    }

    pub fn data_count_key(generation: &ShardedBloomFilter) -> String {
        format!("sub-bloom-filter:data-count:{}", generation.id())
    }

    /// Generations appended so far, as stored (0 when absent)
    pub async fn generation_count(&self, chain: &GrowingSubFilter) -> Result<u32, FilterError> {
        let key = Self::generation_count_key(chain);
        match self.store.get(&key).await? {
            None => Ok(0),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| FilterError::Store(StoreError::NotAnInteger { key })),
        }
    }

    async fn try_grow(&self, chain: &GrowingSubFilter, observed: u32) -> Result<(), FilterError> {
        let lock_key = Self::lock_key(chain);
        if !self.locks.lock(&lock_key, self.lock_lease).await? {
            return Ok(());
        }

        let grown = self.grow_locked(chain, observed).await;
        let released = self.locks.unlock(&lock_key).await;
        grown?;
        released?;
        Ok(())
    }

    async fn grow_locked(&self, chain: &GrowingSubFilter, observed: u32) -> Result<(), FilterError> {
        let current = self.generation_count(chain).await?;
        if current > observed {
            debug!(id = %chain.id(), generation_count = current, "[SubFilter] Already grown");
            return Ok(());
        }
        if current >= chain.max_generations() {
            debug!(id = %chain.id(), generation_count = current, "[SubFilter] Already at limit");
            return Ok(());
        }

        let next = chain.generation(current + 1)?;
        self.sharded.init(next).await?;
        let count = self
            .store
            .increment(&Self::generation_count_key(chain))
            .await?;

        self.metrics.record_generation_created();
        info!(
            id = %chain.id(),
            generation = count,
            capacity = next.data_count(),
            "[SubFilter] Generation appended"
        );
        Ok(())
    }
}

#[async_trait]
impl FilterHandler for SubFilterHandler {
    type Filter = GrowingSubFilter;

    /// Pre-allocate the base generation only
    async fn init(&self, chain: &GrowingSubFilter) -> Result<(), FilterError> {
        self.sharded.init(chain.base()).await
    }

    /// Errors only if the value may not have reached its generation.
    /// Counter and growth failures after that are logged; the next insert
    /// past capacity retries growth.
    async fn add(&self, chain: &GrowingSubFilter, value: &str) -> Result<(), FilterError> {
        let observed = self.generation_count(chain).await?;
        let active = chain.active(observed);

        self.sharded.add(active, value).await?;
        let capacity = active.data_count();
        let inserted = match self.store.increment(&Self::data_count_key(active)).await {
            Ok(inserted) if inserted >= 0 => inserted as u64,
            Ok(_) => return Ok(()),
            Err(e) => {
                warn!(
                    id = %chain.id(),
                    error = %e,
                    "[SubFilter] Insert counter failed, growth check skipped"
                );
                return Ok(());
            }
        };
        if inserted < capacity {
            return Ok(());
        }

        if observed >= chain.max_generations() {
            // Once per chain, not once per insert past the limit
            if inserted == capacity {
                self.metrics.record_growth_limit_reached();
                warn!(
                    id = %chain.id(),
                    generation_count = observed,
                    "[SubFilter] GrowthLimitReached, inserts continue in the last generation"
                );
            }
            return Ok(());
        }

        if let Err(e) = self.try_grow(chain, observed).await {
            self.metrics.record_growth_failure();
            warn!(
                id = %chain.id(),
                generation_count = observed,
                error = %e,
                "[SubFilter] Growth failed, value kept in the active generation"
            );
        }
        Ok(())
    }

    async fn might_contain(
        &self,
        chain: &GrowingSubFilter,
        value: &str,
    ) -> Result<bool, FilterError> {
        let count = self.generation_count(chain).await?;
        for generation in chain.visible(count) {
            if self.sharded.might_contain(generation, value).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn delete(&self, chain: &GrowingSubFilter) -> Result<(), FilterError> {
        // Every generation, activated or not, so an interrupted growth
        // leaves nothing behind
        for generation in chain.all() {
            self.sharded.delete(generation).await?;
            self.store.delete(&Self::data_count_key(generation)).await?;
        }
        self.store.delete(&Self::generation_count_key(chain)).await?;
        Ok(())
    }
}
