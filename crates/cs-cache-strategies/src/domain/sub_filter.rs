//! Growing sub-filter chain
//!
//! A filter sized for `n` items degrades once more than `n` are inserted.
//! Instead of resizing in place, successively larger filters
//! ("generations") are appended on demand, up to `max_generations`.
//!
//! - generation 0: the base filter
//! - generation g >= 1: capacity `n * 2^g`, error rate `p / 2^g`
//!
//! Generations are never merged or migrated, so lookups consult every
//! generation that has been activated.

use serde::{Deserialize, Serialize};

use super::sharded_filter::ShardedBloomFilter;
use super::split_filter::DEFAULT_SPLIT_UNIT;
use crate::error::FilterError;

/// Default upper bound on appended generations
pub const DEFAULT_MAX_GENERATIONS: u32 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowingSubFilter {
    id: String,
    max_generations: u32,
    /// Descriptors for generations `0..=max_generations`, built once
    generations: Vec<ShardedBloomFilter>,
}

impl GrowingSubFilter {
    pub fn create(
        id: impl Into<String>,
        data_count: u64,
        false_positive_rate: f64,
        shard_count: u32,
    ) -> Result<Self, FilterError> {
        Self::with_limits(
            id,
            data_count,
            false_positive_rate,
            shard_count,
            DEFAULT_MAX_GENERATIONS,
            DEFAULT_SPLIT_UNIT,
        )
    }

    pub fn with_limits(
        id: impl Into<String>,
        data_count: u64,
        false_positive_rate: f64,
        shard_count: u32,
        max_generations: u32,
        split_unit: u64,
    ) -> Result<Self, FilterError> {
        let id = id.into();
        let mut generations = Vec::with_capacity(max_generations as usize + 1);

        for generation in 0..=max_generations {
            let factor = 1u64.checked_shl(generation).ok_or_else(|| {
                FilterError::InvalidArgument(format!(
                    "max_generations {} is too large",
                    max_generations
                ))
            })?;
            let capacity = data_count.checked_mul(factor).ok_or_else(|| {
                FilterError::InvalidArgument(format!(
                    "generation {} capacity overflows",
                    generation
                ))
            })?;

            generations.push(ShardedBloomFilter::with_split_unit(
                generation_id(&id, generation),
                capacity,
                false_positive_rate / factor as f64,
                shard_count,
                split_unit,
            )?);
        }

        Ok(Self {
            id,
            max_generations,
            generations,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn max_generations(&self) -> u32 {
        self.max_generations
    }

    pub fn base(&self) -> &ShardedBloomFilter {
        &self.generations[0]
    }

    /// Descriptor for one generation
    pub fn generation(&self, generation: u32) -> Result<&ShardedBloomFilter, FilterError> {
        self.generations
            .get(generation as usize)
            .ok_or_else(|| {
                FilterError::InvalidArgument(format!(
                    "generation {} exceeds max_generations {}",
                    generation, self.max_generations
                ))
            })
    }

    /// Generation receiving inserts while `generation_count` generations
    /// have been appended
    pub fn active(&self, generation_count: u32) -> &ShardedBloomFilter {
        &self.generations[self.clamp(generation_count) as usize]
    }

    /// Every generation a lookup must consult: `0..=generation_count`
    pub fn visible(&self, generation_count: u32) -> &[ShardedBloomFilter] {
        &self.generations[..=self.clamp(generation_count) as usize]
    }

    /// All generations, activated or not
    pub fn all(&self) -> &[ShardedBloomFilter] {
        &self.generations
    }

    fn clamp(&self, generation_count: u32) -> u32 {
        generation_count.min(self.max_generations)
    }
}

fn generation_id(id: &str, generation: u32) -> String {
    if generation == 0 {
        id.to_string()
    } else {
        format!("{}:sub:{}", id, generation)
    }
}
