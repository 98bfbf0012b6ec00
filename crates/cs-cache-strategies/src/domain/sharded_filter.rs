//! Sharded Bloom filter
//!
//! Spreads load and capacity across `shard_count` independent split
//! filters. Splitting and sharding are orthogonal: each shard is itself a
//! [`SplitBloomFilter`].
//!
//! Capacity division: `data_count / shard_count` per shard, with the
//! remainder handed out one item each to the first shards, so the shard
//! capacities always sum to `data_count`.

use serde::{Deserialize, Serialize};

use super::hash_functions::shard_hash;
use super::split_filter::{SplitBloomFilter, DEFAULT_SPLIT_UNIT};
use crate::error::FilterError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShardedBloomFilter {
    id: String,
    data_count: u64,
    false_positive_rate: f64,
    shards: Vec<SplitBloomFilter>,
}

impl ShardedBloomFilter {
    pub fn create(
        id: impl Into<String>,
        data_count: u64,
        false_positive_rate: f64,
        shard_count: u32,
    ) -> Result<Self, FilterError> {
        Self::with_split_unit(
            id,
            data_count,
            false_positive_rate,
            shard_count,
            DEFAULT_SPLIT_UNIT,
        )
    }

    pub fn with_split_unit(
        id: impl Into<String>,
        data_count: u64,
        false_positive_rate: f64,
        shard_count: u32,
        split_unit: u64,
    ) -> Result<Self, FilterError> {
        let id = id.into();
        if shard_count == 0 {
            return Err(FilterError::InvalidArgument(
                "shard_count must be greater than 0".to_string(),
            ));
        }
        if data_count < shard_count as u64 {
            return Err(FilterError::InvalidArgument(format!(
                "data_count {} is smaller than shard_count {}",
                data_count, shard_count
            )));
        }

        let shards = shard_capacities(data_count, shard_count)
            .into_iter()
            .enumerate()
            .map(|(index, capacity)| {
                SplitBloomFilter::with_split_unit(
                    format!("{}:shard:{}", id, index),
                    capacity,
                    false_positive_rate,
                    split_unit,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            data_count,
            false_positive_rate,
            shards,
        })
    }

    /// Index of the shard responsible for `value`. Pure and process-stable.
    pub fn shard_index(&self, value: &str) -> usize {
        (shard_hash(value.as_bytes()) % self.shards.len() as u64) as usize
    }

    /// Shard responsible for `value`
    pub fn find_shard(&self, value: &str) -> &SplitBloomFilter {
        &self.shards[self.shard_index(value)]
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data_count(&self) -> u64 {
        self.data_count
    }

    pub fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    pub fn shard_count(&self) -> u32 {
        self.shards.len() as u32
    }

    pub fn shards(&self) -> &[SplitBloomFilter] {
        &self.shards
    }
}

/// Floor-divide `data_count` across shards, remainder to the first shards
pub fn shard_capacities(data_count: u64, shard_count: u32) -> Vec<u64> {
    let shard_count = shard_count as u64;
    let base = data_count / shard_count;
    let remainder = data_count % shard_count;
    (0..shard_count)
        .map(|index| if index < remainder { base + 1 } else { base })
        .collect()
}
