//! Service Layer
//!
//! Orchestrates domain logic against the outbound ports:
//! - Filter handlers (`bloom_filter`, `split_filter`, `sharded_filter`,
//!   `sub_filter`) keep bitmaps in the key-value store
//! - Cache handlers (`jitter`, `per`) implement read-through caching
//! - `registry` and `interceptor` dispatch by strategy tag
//! - `item_services` exposes one item API per strategy

pub mod bloom_filter;
pub mod interceptor;
pub mod item_services;
pub mod jitter;
pub mod lock;
pub mod per;
pub mod registry;
pub mod sharded_filter;
pub mod split_filter;
pub mod sub_filter;

use rand::rngs::StdRng;
use rand::SeedableRng;

pub use bloom_filter::BloomFilterHandler;
pub use interceptor::CacheInterceptor;
pub use item_services::{
    default_item_services, CachedItemService, DirectItemService, FilterGuardedItemService,
    NullObjectItemService, ITEM_CACHE_NAME,
};
pub use jitter::JitterCacheHandler;
pub use lock::DistributedLockProvider;
pub use per::PerCacheHandler;
pub use registry::StrategyRegistry;
pub use sharded_filter::ShardedFilterHandler;
pub use split_filter::SplitFilterHandler;
pub use sub_filter::SubFilterHandler;

/// Deterministic generator when seeded, entropy otherwise
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    seed.map(StdRng::seed_from_u64)
        .unwrap_or_else(StdRng::from_entropy)
}
