//! Cache interceptor
//!
//! Wraps data-access calls with read-through, write-through and evict
//! behaviour, choosing the handler by strategy tag.
//!
//! Cache-layer failures never reach the caller: a failed read-through
//! degrades to a direct data-source call, and failed writes or evictions
//! are logged and dropped. Two kinds of error do surface:
//! - configuration errors (no handler for the tag)
//! - errors raised by the data source itself, returned as-is without a
//!   second call

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use super::registry::StrategyRegistry;
use crate::domain::CacheStrategy;
use crate::error::CacheError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{CacheHandler, DataSource};

pub struct CacheInterceptor<T: Send + Sync + 'static> {
    registry: StrategyRegistry<dyn CacheHandler<T>>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<T: Send + Sync + 'static> CacheInterceptor<T> {
    pub fn new(handlers: Vec<Arc<dyn CacheHandler<T>>>) -> Self {
        Self {
            registry: StrategyRegistry::new(handlers),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// `{strategy}:{cache name}:{key}`
    pub fn cache_key(strategy: CacheStrategy, cache_name: &str, key: &str) -> String {
        format!("{}:{}:{}", strategy, cache_name, key)
    }

    /// Serve from cache, loading through `source` on miss or refresh
    pub async fn read_through(
        &self,
        strategy: CacheStrategy,
        cache_name: &str,
        key: &str,
        ttl: Duration,
        source: &DataSource<'_, T>,
    ) -> Result<T, CacheError> {
        let handler = self.registry.get(strategy)?;
        let cache_key = Self::cache_key(strategy, cache_name, key);
        debug!(key = %cache_key, "[CacheInterceptor] read-through");

        match handler.fetch(&cache_key, ttl, source).await {
            Ok(value) => Ok(value),
            Err(CacheError::Source(e)) => Err(CacheError::Source(e)),
            Err(e) => {
                self.metrics.record_fallback();
                error!(key = %cache_key, error = %e, "[CacheInterceptor] read-through failed, using data source");
                Ok((source)().await?)
            }
        }
    }

    /// Run `source` (the update), then cache its result
    pub async fn write_through(
        &self,
        strategy: CacheStrategy,
        cache_name: &str,
        key: &str,
        ttl: Duration,
        source: &DataSource<'_, T>,
    ) -> Result<T, CacheError> {
        let handler = self.registry.get(strategy)?;
        let cache_key = Self::cache_key(strategy, cache_name, key);

        let value = (source)().await?;
        debug!(key = %cache_key, "[CacheInterceptor] write-through");
        if let Err(e) = handler.put(&cache_key, ttl, &value).await {
            self.metrics.record_fallback();
            error!(key = %cache_key, error = %e, "[CacheInterceptor] write-through failed");
        }
        Ok(value)
    }

    /// Run `source` (the removal), then drop the cached entry
    pub async fn evict<R: Send>(
        &self,
        strategy: CacheStrategy,
        cache_name: &str,
        key: &str,
        source: &DataSource<'_, R>,
    ) -> Result<R, CacheError> {
        let handler = self.registry.get(strategy)?;
        let cache_key = Self::cache_key(strategy, cache_name, key);

        let result = (source)().await?;
        debug!(key = %cache_key, "[CacheInterceptor] evict");
        if let Err(e) = handler.evict(&cache_key).await {
            self.metrics.record_fallback();
            error!(key = %cache_key, error = %e, "[CacheInterceptor] evict failed");
        }
        Ok(result)
    }
}
