//! Inbound Ports (Driving Ports)
//!
//! The API callers use: cache handlers (read-through / write-through /
//! evict), membership filter handlers, and the per-strategy item services.

use std::time::Duration;

use async_trait::async_trait;

use super::outbound::DataSource;
use crate::domain::{CacheStrategy, ItemRecord};
use crate::error::{CacheError, FilterError};

/// Anything selectable by a strategy tag
pub trait StrategySupport: Send + Sync {
    fn supports(&self, strategy: CacheStrategy) -> bool;
}

/// Cache handler contract.
///
/// - `fetch`: read-through. On miss, undecodable entry, or a strategy
///   specific refresh trigger, call `source` and store its result.
/// - `put`: write-through of an already computed value.
/// - `evict`: unconditional removal.
#[async_trait]
pub trait CacheHandler<T: Send + Sync + 'static>: StrategySupport {
    async fn fetch<'s>(
        &self,
        key: &str,
        ttl: Duration,
        source: &DataSource<'s, T>,
    ) -> Result<T, CacheError>;

    async fn put(&self, key: &str, ttl: Duration, value: &T) -> Result<(), CacheError>;

    async fn evict(&self, key: &str) -> Result<(), CacheError>;
}

/// Membership filter backed by the external store.
///
/// Filter descriptors are immutable values passed by reference; handlers
/// hold only the store connection.
#[async_trait]
pub trait FilterHandler: Send + Sync {
    type Filter: Send + Sync;

    /// Pre-allocate bit storage in bounded steps. Optional for correctness.
    async fn init(&self, filter: &Self::Filter) -> Result<(), FilterError>;

    async fn add(&self, filter: &Self::Filter, value: &str) -> Result<(), FilterError>;

    /// False positives possible, false negatives never
    async fn might_contain(&self, filter: &Self::Filter, value: &str) -> Result<bool, FilterError>;

    /// Remove every key backing the filter
    async fn delete(&self, filter: &Self::Filter) -> Result<(), FilterError>;
}

/// Item access through one cache strategy
#[async_trait]
pub trait ItemCacheService: StrategySupport {
    /// `None` when the item does not exist (or a filter rejected it)
    async fn read(&self, item_id: u64) -> Result<Option<ItemRecord>, CacheError>;

    async fn create(&self, data: String) -> Result<ItemRecord, CacheError>;

    async fn update(&self, item_id: u64, data: String) -> Result<ItemRecord, CacheError>;

    async fn delete(&self, item_id: u64) -> Result<(), CacheError>;
}
