//! Cache strategy tags

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Strategy selecting a cache handler or a filter-guarded item service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheStrategy {
    /// No caching, direct data-source access
    None,
    /// Cache every read, including "absent", for a short TTL
    NullObjectPattern,
    /// Read-through cache with randomized TTL
    Jitter,
    /// Read-through cache with probabilistic early recomputation
    ProbabilisticEarlyRecomputation,
    /// Single-bitmap Bloom filter guard
    BloomFilter,
    /// Bloom filter split across fixed-size segments
    SplitBloomFilter,
    /// Split filter sharded by value hash
    SplitShardedBloomFilter,
    /// Sharded split filter with growing generations
    SplitShardedSubBloomFilter,
}

impl CacheStrategy {
    pub const ALL: [CacheStrategy; 8] = [
        CacheStrategy::None,
        CacheStrategy::NullObjectPattern,
        CacheStrategy::Jitter,
        CacheStrategy::ProbabilisticEarlyRecomputation,
        CacheStrategy::BloomFilter,
        CacheStrategy::SplitBloomFilter,
        CacheStrategy::SplitShardedBloomFilter,
        CacheStrategy::SplitShardedSubBloomFilter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStrategy::None => "NONE",
            CacheStrategy::NullObjectPattern => "NULL_OBJECT_PATTERN",
            CacheStrategy::Jitter => "JITTER",
            CacheStrategy::ProbabilisticEarlyRecomputation => "PROBABILISTIC_EARLY_RECOMPUTATION",
            CacheStrategy::BloomFilter => "BLOOM_FILTER",
            CacheStrategy::SplitBloomFilter => "SPLIT_BLOOM_FILTER",
            CacheStrategy::SplitShardedBloomFilter => "SPLIT_SHARDED_BLOOM_FILTER",
            CacheStrategy::SplitShardedSubBloomFilter => "SPLIT_SHARDED_SUB_BLOOM_FILTER",
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheStrategy {
    type Err = CacheError;

    /// Case-insensitive; `-` and `_` are interchangeable
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        CacheStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| CacheError::MalformedStrategy(s.to_string()))
    }
}
