//! Split Bloom filter over one bitmap key per segment
//!
//! Key per segment: `split-bloom-filter:{id}:split:{index}`. The k bit
//! operations of one `add` / `might_contain` may land in different
//! segment keys but still go out as a single pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use super::bloom_filter::{all_bits_set, init_bitmap};
use crate::domain::{SplitBloomFilter, StrategyConfig};
use crate::error::FilterError;
use crate::ports::{FilterHandler, KeyValueStore, StoreCommand};

pub struct SplitFilterHandler {
    store: Arc<dyn KeyValueStore>,
    init_chunk_bits: u64,
}

impl SplitFilterHandler {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &StrategyConfig) -> Self {
        Self {
            store,
            init_chunk_bits: config.init_chunk_bits,
        }
    }

    pub fn key(filter: &SplitBloomFilter, split_index: u64) -> String {
        format!("split-bloom-filter:{}:split:{}", filter.id(), split_index)
    }

    fn keys(filter: &SplitBloomFilter) -> impl Iterator<Item = String> + '_ {
        (0..filter.split_count()).map(move |index| Self::key(filter, index))
    }
}

#[async_trait]
impl FilterHandler for SplitFilterHandler {
    type Filter = SplitBloomFilter;

    async fn init(&self, filter: &SplitBloomFilter) -> Result<(), FilterError> {
        for split_index in 0..filter.split_count() {
            let bit_size = filter.split_bit_size(split_index)?;
            init_bitmap(
                self.store.as_ref(),
                &Self::key(filter, split_index),
                bit_size,
                self.init_chunk_bits,
            )
            .await?;
        }
        Ok(())
    }

    async fn add(&self, filter: &SplitBloomFilter, value: &str) -> Result<(), FilterError> {
        let commands = filter
            .hash_locations(value)?
            .into_iter()
            .map(|loc| {
                StoreCommand::set_bit(Self::key(filter, loc.split_index), loc.local_offset, true)
            })
            .collect();
        self.store.pipeline(commands).await?;
        Ok(())
    }

    async fn might_contain(
        &self,
        filter: &SplitBloomFilter,
        value: &str,
    ) -> Result<bool, FilterError> {
        let commands = filter
            .hash_locations(value)?
            .into_iter()
            .map(|loc| StoreCommand::get_bit(Self::key(filter, loc.split_index), loc.local_offset))
            .collect();
        let replies = self.store.pipeline(commands).await?;
        Ok(all_bits_set(&replies)?)
    }

    async fn delete(&self, filter: &SplitBloomFilter) -> Result<(), FilterError> {
        let commands = Self::keys(filter).map(StoreCommand::delete).collect();
        self.store.pipeline(commands).await?;
        Ok(())
    }
}
