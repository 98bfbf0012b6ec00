//! Probabilistic early recomputation (PER) cache handler
//!
//! Each entry carries the cost of its last recomputation (`delta`). Readers
//! draw a random number and recompute early with a probability that rises
//! as expiry nears and as `delta` grows, so expensive entries are refreshed
//! by a random few readers ahead of expiry instead of by everyone at it.
//!
//! The store-level TTL equals the logical TTL, bounding staleness even if
//! the trigger never fires.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::seeded_rng;
use crate::adapters::DataSerializer;
use crate::domain::{CacheData, CacheStrategy, StrategyConfig};
use crate::error::CacheError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{CacheHandler, DataSource, KeyValueStore, StrategySupport, TimeSource};

pub struct PerCacheHandler {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn TimeSource>,
    serializer: DataSerializer,
    rng: Mutex<StdRng>,
    beta: f64,
    default_delta_millis: u64,
    metrics: Arc<dyn MetricsRecorder>,
}

impl PerCacheHandler {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn TimeSource>,
        config: &StrategyConfig,
    ) -> Self {
        Self {
            store,
            clock,
            serializer: DataSerializer,
            rng: Mutex::new(seeded_rng(config.rng_seed)),
            beta: config.per_beta,
            default_delta_millis: config.per_default_delta_ms,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Uniform draw from (0, 1); ln(0) is excluded
    fn draw(&self) -> f64 {
        self.rng.lock().gen_range(f64::MIN_POSITIVE..1.0)
    }

    async fn write<T: Serialize + Sync>(
        &self,
        key: &str,
        ttl: Duration,
        value: &T,
        delta_millis: u64,
    ) -> Result<(), CacheError> {
        let now = self.clock.now_millis();
        let record = CacheData::new(
            self.serializer.serialize(value)?,
            delta_millis,
            now,
            ttl.as_millis() as u64,
        );
        let data = self.serializer.serialize(&record)?;
        self.store.set(key, &data, Some(ttl)).await?;
        self.metrics.record_refresh();
        Ok(())
    }

    /// Cached value, unless absent, undecodable, or picked for early
    /// recomputation
    async fn read_fresh<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.store.get(key).await? else {
            self.metrics.record_miss();
            return Ok(None);
        };
        let Some(record) = self.serializer.deserialize::<CacheData>(&raw) else {
            self.metrics.record_miss();
            return Ok(None);
        };

        let now = self.clock.now_millis();
        if record.should_recompute(now, self.beta, self.draw()) {
            self.metrics.record_early_refresh();
            debug!(
                key = %key,
                delta_ms = record.computation_time_millis(),
                remaining_ms = record.expired_at_millis().saturating_sub(now),
                "[PerCache] Early recomputation triggered"
            );
            return Ok(None);
        }

        match self.serializer.deserialize::<T>(record.data()) {
            Some(value) => {
                self.metrics.record_hit();
                Ok(Some(value))
            }
            None => {
                self.metrics.record_miss();
                Ok(None)
            }
        }
    }
}

impl StrategySupport for PerCacheHandler {
    fn supports(&self, strategy: CacheStrategy) -> bool {
        strategy == CacheStrategy::ProbabilisticEarlyRecomputation
    }
}

#[async_trait]
impl<T> CacheHandler<T> for PerCacheHandler
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch<'s>(
        &self,
        key: &str,
        ttl: Duration,
        source: &DataSource<'s, T>,
    ) -> Result<T, CacheError> {
        if let Some(value) = self.read_fresh::<T>(key).await? {
            return Ok(value);
        }

        let started = self.clock.now_millis();
        let value = (source)().await?;
        let delta = self.clock.now_millis().saturating_sub(started);

        if let Err(e) = self.write(key, ttl, &value, delta).await {
            warn!(key = %key, error = %e, "[PerCache] Write-back failed");
        }
        Ok(value)
    }

    /// No recomputation was measured here, so the configured default delta
    /// is recorded
    async fn put(&self, key: &str, ttl: Duration, value: &T) -> Result<(), CacheError> {
        self.write(key, ttl, value, self.default_delta_millis).await
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await?;
        Ok(())
    }
}
