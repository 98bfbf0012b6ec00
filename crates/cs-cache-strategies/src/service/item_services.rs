//! Item services, one per cache strategy
//!
//! | strategy                         | service                    |
//! |----------------------------------|----------------------------|
//! | NONE                             | `DirectItemService`        |
//! | NULL_OBJECT_PATTERN              | `NullObjectItemService`    |
//! | JITTER, PROBABILISTIC_EARLY_...  | `CachedItemService`        |
//! | BLOOM_FILTER and split variants  | `FilterGuardedItemService` |
//!
//! `default_item_services` wires all of them into one registry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::bloom_filter::BloomFilterHandler;
use super::interceptor::CacheInterceptor;
use super::jitter::JitterCacheHandler;
use super::per::PerCacheHandler;
use super::registry::StrategyRegistry;
use super::sharded_filter::ShardedFilterHandler;
use super::split_filter::SplitFilterHandler;
use super::sub_filter::SubFilterHandler;
use crate::adapters::DataSerializer;
use crate::domain::{
    BloomFilterParams, CacheStrategy, GrowingSubFilter, ItemRecord, ShardedBloomFilter,
    SplitBloomFilter, StrategyConfig,
};
use crate::error::{CacheError, DataError};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{
    CacheHandler, DataSource, FilterHandler, ItemCacheService, ItemRepository, KeyValueStore,
    StrategySupport, TimeSource,
};

/// Cache name used in item cache keys
pub const ITEM_CACHE_NAME: &str = "item";

/// Designed capacity of the default item filters
pub const ITEM_FILTER_CAPACITY: u64 = 1000;

pub const ITEM_FILTER_FALSE_POSITIVE_RATE: f64 = 0.01;

pub const ITEM_FILTER_SHARDS: u32 = 4;

// ---------------------------------------------------------------------------
// NONE
// ---------------------------------------------------------------------------

/// Direct repository access, no caching
pub struct DirectItemService {
    repository: Arc<dyn ItemRepository>,
}

impl DirectItemService {
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self { repository }
    }
}

impl StrategySupport for DirectItemService {
    fn supports(&self, strategy: CacheStrategy) -> bool {
        strategy == CacheStrategy::None
    }
}

#[async_trait]
impl ItemCacheService for DirectItemService {
    async fn read(&self, item_id: u64) -> Result<Option<ItemRecord>, CacheError> {
        Ok(self.repository.read(item_id).await?)
    }

    async fn create(&self, data: String) -> Result<ItemRecord, CacheError> {
        Ok(self.repository.create(data).await?)
    }

    async fn update(&self, item_id: u64, data: String) -> Result<ItemRecord, CacheError> {
        Ok(self.repository.update(item_id, data).await?)
    }

    async fn delete(&self, item_id: u64) -> Result<(), CacheError> {
        Ok(self.repository.delete(item_id).await?)
    }
}

// ---------------------------------------------------------------------------
// NULL_OBJECT_PATTERN
// ---------------------------------------------------------------------------

/// Cached read result; `Missing` is the null object
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CachedItem {
    Present(ItemRecord),
    Missing,
}

/// Caches every read result, absence included, so repeated lookups for a
/// nonexistent id are answered by the cache instead of the repository.
pub struct NullObjectItemService {
    repository: Arc<dyn ItemRepository>,
    store: Arc<dyn KeyValueStore>,
    serializer: DataSerializer,
    ttl: Duration,
    metrics: Arc<dyn MetricsRecorder>,
}

impl NullObjectItemService {
    pub fn new(
        repository: Arc<dyn ItemRepository>,
        store: Arc<dyn KeyValueStore>,
        config: &StrategyConfig,
    ) -> Self {
        Self {
            repository,
            store,
            serializer: DataSerializer,
            ttl: config.null_object_ttl,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn cache_key(item_id: u64) -> String {
        format!(
            "{}:{}:{}",
            CacheStrategy::NullObjectPattern,
            ITEM_CACHE_NAME,
            item_id
        )
    }

    async fn cached(&self, key: &str) -> Option<CachedItem> {
        match self.store.get(key).await {
            Ok(raw) => raw.and_then(|raw| self.serializer.deserialize(&raw)),
            Err(e) => {
                self.metrics.record_fallback();
                error!(key = %key, error = %e, "[NullObject] Cache read failed, using repository");
                None
            }
        }
    }

    async fn remember(&self, key: &str, entry: &CachedItem) {
        let written = match self.serializer.serialize(entry) {
            Ok(data) => self.store.set(key, &data, Some(self.ttl)).await.map_err(CacheError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            error!(key = %key, error = %e, "[NullObject] Cache write failed");
        }
    }

    async fn forget(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            error!(key = %key, error = %e, "[NullObject] Evict failed");
        }
    }
}

impl StrategySupport for NullObjectItemService {
    fn supports(&self, strategy: CacheStrategy) -> bool {
        strategy == CacheStrategy::NullObjectPattern
    }
}

#[async_trait]
impl ItemCacheService for NullObjectItemService {
    async fn read(&self, item_id: u64) -> Result<Option<ItemRecord>, CacheError> {
        let key = Self::cache_key(item_id);
        if let Some(entry) = self.cached(&key).await {
            self.metrics.record_hit();
            return Ok(match entry {
                CachedItem::Present(item) => Some(item),
                CachedItem::Missing => None,
            });
        }

        self.metrics.record_miss();
        let item = self.repository.read(item_id).await?;
        let entry = match &item {
            Some(item) => CachedItem::Present(item.clone()),
            None => CachedItem::Missing,
        };
        self.remember(&key, &entry).await;
        Ok(item)
    }

    async fn create(&self, data: String) -> Result<ItemRecord, CacheError> {
        let item = self.repository.create(data).await?;
        // A null object may have been cached for this id before it existed
        self.forget(&Self::cache_key(item.item_id)).await;
        Ok(item)
    }

    async fn update(&self, item_id: u64, data: String) -> Result<ItemRecord, CacheError> {
        let item = self.repository.update(item_id, data).await?;
        self.forget(&Self::cache_key(item_id)).await;
        Ok(item)
    }

    async fn delete(&self, item_id: u64) -> Result<(), CacheError> {
        self.repository.delete(item_id).await?;
        self.forget(&Self::cache_key(item_id)).await;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JITTER / PROBABILISTIC_EARLY_RECOMPUTATION
// ---------------------------------------------------------------------------

/// Item access through the cache interceptor: read-through on `read`,
/// write-through on `update`, evict on `delete`.
pub struct CachedItemService {
    strategy: CacheStrategy,
    repository: Arc<dyn ItemRepository>,
    interceptor: Arc<CacheInterceptor<ItemRecord>>,
    ttl: Duration,
}

impl CachedItemService {
    pub fn new(
        strategy: CacheStrategy,
        repository: Arc<dyn ItemRepository>,
        interceptor: Arc<CacheInterceptor<ItemRecord>>,
        config: &StrategyConfig,
    ) -> Self {
        Self {
            strategy,
            repository,
            interceptor,
            ttl: config.item_ttl,
        }
    }
}

impl StrategySupport for CachedItemService {
    fn supports(&self, strategy: CacheStrategy) -> bool {
        strategy == self.strategy
    }
}

#[async_trait]
impl ItemCacheService for CachedItemService {
    async fn read(&self, item_id: u64) -> Result<Option<ItemRecord>, CacheError> {
        // Absence is not cached: NotFound passes through the interceptor
        // as a source error
        let load: &DataSource<'_, ItemRecord> = &|| {
            async move {
                self.repository
                    .read(item_id)
                    .await?
                    .ok_or_else(|| DataError::NotFound(format!("item {}", item_id)))
            }
            .boxed()
        };

        let key = item_id.to_string();
        match self
            .interceptor
            .read_through(self.strategy, ITEM_CACHE_NAME, &key, self.ttl, load)
            .await
        {
            Ok(item) => Ok(Some(item)),
            Err(CacheError::Source(DataError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, data: String) -> Result<ItemRecord, CacheError> {
        Ok(self.repository.create(data).await?)
    }

    async fn update(&self, item_id: u64, data: String) -> Result<ItemRecord, CacheError> {
        let load: &DataSource<'_, ItemRecord> = &|| {
            let data = data.clone();
            async move { self.repository.update(item_id, data).await }.boxed()
        };

        let key = item_id.to_string();
        self.interceptor
            .write_through(self.strategy, ITEM_CACHE_NAME, &key, self.ttl, load)
            .await
    }

    async fn delete(&self, item_id: u64) -> Result<(), CacheError> {
        let load: &DataSource<'_, ()> =
            &|| async move { self.repository.delete(item_id).await }.boxed();

        let key = item_id.to_string();
        self.interceptor
            .evict(self.strategy, ITEM_CACHE_NAME, &key, load)
            .await
    }
}

// ---------------------------------------------------------------------------
// BLOOM_FILTER / SPLIT_BLOOM_FILTER / SPLIT_SHARDED_BLOOM_FILTER /
// SPLIT_SHARDED_SUB_BLOOM_FILTER
// ---------------------------------------------------------------------------

/// Rejects reads for ids the membership filter has never seen, without
/// touching the repository. Created ids are added to the filter.
pub struct FilterGuardedItemService<H: FilterHandler> {
    strategy: CacheStrategy,
    repository: Arc<dyn ItemRepository>,
    handler: H,
    filter: H::Filter,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<H: FilterHandler> FilterGuardedItemService<H> {
    pub fn new(
        strategy: CacheStrategy,
        repository: Arc<dyn ItemRepository>,
        handler: H,
        filter: H::Filter,
    ) -> Self {
        Self {
            strategy,
            repository,
            handler,
            filter,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn filter(&self) -> &H::Filter {
        &self.filter
    }

    /// Pre-allocate the filter's bit storage
    pub async fn init_filter(&self) -> Result<(), CacheError> {
        Ok(self.handler.init(&self.filter).await?)
    }

    /// Drop the filter's storage entirely
    pub async fn reset_filter(&self) -> Result<(), CacheError> {
        Ok(self.handler.delete(&self.filter).await?)
    }
}

impl<H: FilterHandler> StrategySupport for FilterGuardedItemService<H> {
    fn supports(&self, strategy: CacheStrategy) -> bool {
        strategy == self.strategy
    }
}

#[async_trait]
impl<H: FilterHandler> ItemCacheService for FilterGuardedItemService<H> {
    async fn read(&self, item_id: u64) -> Result<Option<ItemRecord>, CacheError> {
        let value = ItemRecord::filter_value(item_id);
        match self.handler.might_contain(&self.filter, &value).await {
            Ok(true) => {}
            Ok(false) => {
                self.metrics.record_filter_rejection();
                debug!(item_id, strategy = %self.strategy, "[FilterGuard] Rejected unknown id");
                return Ok(None);
            }
            Err(e) => {
                self.metrics.record_fallback();
                error!(item_id, error = %e, "[FilterGuard] Filter lookup failed, using repository");
            }
        }
        Ok(self.repository.read(item_id).await?)
    }

    async fn create(&self, data: String) -> Result<ItemRecord, CacheError> {
        let item = self.repository.create(data).await?;
        let value = ItemRecord::filter_value(item.item_id);
        if let Err(e) = self.handler.add(&self.filter, &value).await {
            // Some of the id's bits may be missing; reads for it can be
            // rejected until the filter is rebuilt
            error!(
                item_id = item.item_id,
                error = %e,
                "[FilterGuard] Filter insert may be incomplete"
            );
        }
        Ok(item)
    }

    async fn update(&self, item_id: u64, data: String) -> Result<ItemRecord, CacheError> {
        Ok(self.repository.update(item_id, data).await?)
    }

    /// Bloom filters cannot forget members; the id stays "possibly present"
    async fn delete(&self, item_id: u64) -> Result<(), CacheError> {
        Ok(self.repository.delete(item_id).await?)
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// One item service per strategy, dispatched by tag
pub fn default_item_services(
    repository: Arc<dyn ItemRepository>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn TimeSource>,
    config: &StrategyConfig,
    metrics: Arc<dyn MetricsRecorder>,
) -> Result<StrategyRegistry<dyn ItemCacheService>, CacheError> {
    let cache_handlers: Vec<Arc<dyn CacheHandler<ItemRecord>>> = vec![
        Arc::new(JitterCacheHandler::new(store.clone(), config).with_metrics(metrics.clone())),
        Arc::new(PerCacheHandler::new(store.clone(), clock, config).with_metrics(metrics.clone())),
    ];
    let interceptor =
        Arc::new(CacheInterceptor::new(cache_handlers).with_metrics(metrics.clone()));

    let unit = config.split_unit_bits;
    let bloom = BloomFilterParams::create(
        "item-bloom-filter",
        ITEM_FILTER_CAPACITY,
        ITEM_FILTER_FALSE_POSITIVE_RATE,
    )?;
    let split = SplitBloomFilter::with_split_unit(
        "item-split-bloom-filter",
        ITEM_FILTER_CAPACITY,
        ITEM_FILTER_FALSE_POSITIVE_RATE,
        unit,
    )?;
    let sharded = ShardedBloomFilter::with_split_unit(
        "item-sharded-bloom-filter",
        ITEM_FILTER_CAPACITY,
        ITEM_FILTER_FALSE_POSITIVE_RATE,
        ITEM_FILTER_SHARDS,
        unit,
    )?;
    let chain = GrowingSubFilter::with_limits(
        "item-sub-bloom-filter",
        ITEM_FILTER_CAPACITY,
        ITEM_FILTER_FALSE_POSITIVE_RATE,
        ITEM_FILTER_SHARDS,
        config.max_generations,
        unit,
    )?;

    let services: Vec<Arc<dyn ItemCacheService>> = vec![
        Arc::new(DirectItemService::new(repository.clone())),
        Arc::new(
            NullObjectItemService::new(repository.clone(), store.clone(), config)
                .with_metrics(metrics.clone()),
        ),
        Arc::new(CachedItemService::new(
            CacheStrategy::Jitter,
            repository.clone(),
            interceptor.clone(),
            config,
        )),
        Arc::new(CachedItemService::new(
            CacheStrategy::ProbabilisticEarlyRecomputation,
            repository.clone(),
            interceptor,
            config,
        )),
        Arc::new(
            FilterGuardedItemService::new(
                CacheStrategy::BloomFilter,
                repository.clone(),
                BloomFilterHandler::new(store.clone(), config),
                bloom,
            )
            .with_metrics(metrics.clone()),
        ),
        Arc::new(
            FilterGuardedItemService::new(
                CacheStrategy::SplitBloomFilter,
                repository.clone(),
                SplitFilterHandler::new(store.clone(), config),
                split,
            )
            .with_metrics(metrics.clone()),
        ),
        Arc::new(
            FilterGuardedItemService::new(
                CacheStrategy::SplitShardedBloomFilter,
                repository.clone(),
                ShardedFilterHandler::new(store.clone(), config),
                sharded,
            )
            .with_metrics(metrics.clone()),
        ),
        Arc::new(
            FilterGuardedItemService::new(
                CacheStrategy::SplitShardedSubBloomFilter,
                repository,
                SubFilterHandler::new(store, config).with_metrics(metrics.clone()),
                chain,
            )
            .with_metrics(metrics),
        ),
    ];

    Ok(StrategyRegistry::new(services))
}
