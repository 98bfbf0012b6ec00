//! Jitter cache handler
//!
//! Read-through cache whose entries expire at `ttl ± range` seconds, so
//! keys cached together do not all expire together.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::seeded_rng;
use crate::adapters::DataSerializer;
use crate::domain::{apply_jitter, CacheStrategy, StrategyConfig};
use crate::error::CacheError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{CacheHandler, DataSource, KeyValueStore, StrategySupport};

pub struct JitterCacheHandler {
    store: Arc<dyn KeyValueStore>,
    serializer: DataSerializer,
    rng: Mutex<StdRng>,
    range_secs: u64,
    metrics: Arc<dyn MetricsRecorder>,
}

impl JitterCacheHandler {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &StrategyConfig) -> Self {
        Self {
            store,
            serializer: DataSerializer,
            rng: Mutex::new(seeded_rng(config.rng_seed)),
            range_secs: config.jitter_range_secs,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    fn jittered(&self, ttl: Duration) -> Result<Duration, CacheError> {
        let mut rng = self.rng.lock();
        apply_jitter(ttl, self.range_secs, &mut *rng)
    }
}

impl StrategySupport for JitterCacheHandler {
    fn supports(&self, strategy: CacheStrategy) -> bool {
        strategy == CacheStrategy::Jitter
    }
}

#[async_trait]
impl<T> CacheHandler<T> for JitterCacheHandler
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch<'s>(
        &self,
        key: &str,
        ttl: Duration,
        source: &DataSource<'s, T>,
    ) -> Result<T, CacheError> {
        if let Some(raw) = self.store.get(key).await? {
            if let Some(value) = self.serializer.deserialize::<T>(&raw) {
                self.metrics.record_hit();
                return Ok(value);
            }
        }
        self.metrics.record_miss();
        debug!(key = %key, "[JitterCache] Miss, loading from source");

        let value = (source)().await?;
        // The value is already computed; a failed write only costs a
        // future miss
        if let Err(e) = CacheHandler::<T>::put(self, key, ttl, &value).await {
            warn!(key = %key, error = %e, "[JitterCache] Write-back failed");
        }
        Ok(value)
    }

    async fn put(&self, key: &str, ttl: Duration, value: &T) -> Result<(), CacheError> {
        let effective = self.jittered(ttl)?;
        let data = self.serializer.serialize(value)?;
        self.store.set(key, &data, Some(effective)).await?;
        self.metrics.record_refresh();
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await?;
        Ok(())
    }
}
