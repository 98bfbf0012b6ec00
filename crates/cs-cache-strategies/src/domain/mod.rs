//! Domain Layer - Pure logic
//!
//! This layer contains:
//! - Bloom filter parameter derivation and hashing
//! - Split, sharded and growing filter descriptors
//! - PER cache record and trigger
//! - TTL jitter
//! - Strategy tags and configuration
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - Randomness and time are passed in, never read ambiently

pub mod cache_data;
pub mod config;
pub mod hash_functions;
pub mod item;
pub mod jitter;
pub mod parameters;
pub mod sharded_filter;
pub mod split_filter;
pub mod strategy;
pub mod sub_filter;

pub use cache_data::CacheData;
pub use config::{StrategyConfig, StrategyConfigBuilder};
pub use item::ItemRecord;
pub use jitter::apply_jitter;
pub use parameters::{calculate_fpr, BloomFilterParams};
pub use sharded_filter::ShardedBloomFilter;
pub use split_filter::{BitLocation, SplitBloomFilter, DEFAULT_SPLIT_UNIT};
pub use strategy::CacheStrategy;
pub use sub_filter::GrowingSubFilter;
