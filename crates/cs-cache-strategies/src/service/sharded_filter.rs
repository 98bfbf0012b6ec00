//! Sharded split Bloom filter
//!
//! Each value is routed to exactly one shard by a stable hash, and that
//! shard is handled as an ordinary split filter.

use std::sync::Arc;

use async_trait::async_trait;

use super::split_filter::SplitFilterHandler;
use crate::domain::{ShardedBloomFilter, StrategyConfig};
use crate::error::FilterError;
use crate::ports::{FilterHandler, KeyValueStore};

pub struct ShardedFilterHandler {
    split: SplitFilterHandler,
}

impl ShardedFilterHandler {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &StrategyConfig) -> Self {
        Self {
            split: SplitFilterHandler::new(store, config),
        }
    }
}

#[async_trait]
impl FilterHandler for ShardedFilterHandler {
    type Filter = ShardedBloomFilter;

    async fn init(&self, filter: &ShardedBloomFilter) -> Result<(), FilterError> {
        for shard in filter.shards() {
            self.split.init(shard).await?;
        }
        Ok(())
    }

    async fn add(&self, filter: &ShardedBloomFilter, value: &str) -> Result<(), FilterError> {
        self.split.add(filter.find_shard(value), value).await
    }

    async fn might_contain(
        &self,
        filter: &ShardedBloomFilter,
        value: &str,
    ) -> Result<bool, FilterError> {
        self.split.might_contain(filter.find_shard(value), value).await
    }

    async fn delete(&self, filter: &ShardedBloomFilter) -> Result<(), FilterError> {
        for shard in filter.shards() {
            self.split.delete(shard).await?;
        }
        Ok(())
    }
}
