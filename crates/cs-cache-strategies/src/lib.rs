//! # CS Cache Strategies
//!
//! Cache-stampede and cache-penetration mitigation over an external
//! key-value store.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `BloomFilterParams`: optimal `(m, k)` derivation and hashing
//!   - `SplitBloomFilter`, `ShardedBloomFilter`, `GrowingSubFilter`:
//!     filter layouts over bounded bitmap segments
//!   - `CacheData`: PER record and early-recompute trigger
//!   - `apply_jitter`: TTL randomisation
//!   - `CacheStrategy`, `StrategyConfig`
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `CacheHandler`, `FilterHandler`, `ItemCacheService`: driving ports
//!   - `KeyValueStore`, `TimeSource`, `ItemRepository`: driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - Filter handlers for each layout
//!   - `JitterCacheHandler`, `PerCacheHandler`
//!   - `DistributedLockProvider`: lease lock for filter growth
//!   - `StrategyRegistry`, `CacheInterceptor`: dispatch by strategy tag
//!   - Item services, one per strategy
//!
//! - **Adapters Layer** (`adapters/`): In-memory store, clocks, JSON
//!   serializer, item repository
//!
//! ## Invariants
//!
//! - No false negatives: once `add` returns, `might_contain` is true for
//!   that value, across every generation of a growing filter
//! - A growing filter never exceeds its configured generation limit
//! - Cache-layer failures degrade to the data source; only configuration
//!   errors and data-source errors reach the caller
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cs_cache_strategies::{
//!     default_item_services, CacheMetrics, CacheStrategy, InMemoryItemRepository,
//!     InMemoryStore, StrategyConfig, SystemClock,
//! };
//!
//! let config = StrategyConfig::from_env()?;
//! let services = default_item_services(
//!     Arc::new(InMemoryItemRepository::new()),
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(SystemClock),
//!     &config,
//!     Arc::new(CacheMetrics::new()),
//! )?;
//!
//! let service = services.get(CacheStrategy::SplitShardedSubBloomFilter)?;
//! let item = service.create("payload".to_string()).await?;
//! assert_eq!(service.read(item.item_id).await?, Some(item));
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod testing;

// Re-exports for convenience
pub use adapters::{
    DataSerializer, InMemoryItemRepository, InMemoryStore, ManualClock, SystemClock,
};
pub use domain::{
    BloomFilterParams, CacheData, CacheStrategy, GrowingSubFilter, ItemRecord,
    ShardedBloomFilter, SplitBloomFilter, StrategyConfig, StrategyConfigBuilder,
};
pub use error::{CacheError, DataError, FilterError, StoreError};
pub use metrics::{CacheMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{
    CacheHandler, DataSource, FilterHandler, ItemCacheService, ItemRepository, KeyValueStore,
    StrategySupport, TimeSource,
};
pub use service::{
    default_item_services, BloomFilterHandler, CacheInterceptor, DistributedLockProvider,
    JitterCacheHandler, PerCacheHandler, ShardedFilterHandler, SplitFilterHandler,
    StrategyRegistry, SubFilterHandler,
};
