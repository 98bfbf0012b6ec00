//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for external callers
//! - Driven Ports (outbound) - Dependencies on the store and data sources

pub mod inbound;
pub mod outbound;

pub use inbound::{CacheHandler, FilterHandler, ItemCacheService, StrategySupport};
pub use outbound::{
    DataSource, ItemRepository, KeyValueStore, SourceFuture, StoreCommand, StoreReply, TimeSource,
};
