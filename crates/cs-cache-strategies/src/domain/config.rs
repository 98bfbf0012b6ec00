//! Strategy configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use cs_cache_strategies::domain::StrategyConfigBuilder;
//!
//! let config = StrategyConfigBuilder::new()
//!     .jitter_range_secs(3)
//!     .per_beta(1.0)
//!     .rng_seed(42)
//!     .build()
//!     .expect("Valid config");
//! ```

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::jitter::DEFAULT_JITTER_RANGE_SECS;
use super::split_filter::DEFAULT_SPLIT_UNIT;
use super::sub_filter::DEFAULT_MAX_GENERATIONS;
use crate::error::CacheError;

/// Bits touched per step when pre-allocating a bitmap (8 MB)
pub const DEFAULT_INIT_CHUNK_BITS: u64 = 8 * 1024 * 1024 * 8;

/// Configuration shared by handlers and item services
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Half-range of TTL jitter, seconds
    pub jitter_range_secs: u64,
    /// PER sensitivity; larger recomputes earlier
    pub per_beta: f64,
    /// Delta recorded by externally invoked `put`, where nothing was measured
    pub per_default_delta_ms: u64,
    /// Lease on the sub-filter growth lock
    pub lock_lease: Duration,
    /// Maximum generations appended to a growing sub-filter
    pub max_generations: u32,
    /// Bits per split segment
    pub split_unit_bits: u64,
    /// Bits per pre-allocation step in `init`
    pub init_chunk_bits: u64,
    /// TTL for cached items (jitter / PER services)
    pub item_ttl: Duration,
    /// TTL for null-object entries
    pub null_object_ttl: Duration,
    /// Seed for jitter and PER draws; entropy when absent
    pub rng_seed: Option<u64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            jitter_range_secs: DEFAULT_JITTER_RANGE_SECS,
            per_beta: 1.0,
            per_default_delta_ms: 100,
            lock_lease: Duration::from_secs(60),
            max_generations: DEFAULT_MAX_GENERATIONS,
            split_unit_bits: DEFAULT_SPLIT_UNIT,
            init_chunk_bits: DEFAULT_INIT_CHUNK_BITS,
            item_ttl: Duration::from_secs(5),
            null_object_ttl: Duration::from_secs(1),
            rng_seed: None,
        }
    }
}

impl StrategyConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    ///
    /// # Environment Variables
    ///
    /// - `CS_JITTER_RANGE_SECS`, `CS_PER_BETA`, `CS_PER_DEFAULT_DELTA_MS`
    /// - `CS_LOCK_LEASE_SECS`, `CS_MAX_GENERATIONS`
    /// - `CS_SPLIT_UNIT_BITS`, `CS_INIT_CHUNK_BITS`
    /// - `CS_ITEM_TTL_SECS`, `CS_NULL_OBJECT_TTL_SECS`, `CS_RNG_SEED`
    pub fn from_env() -> Result<Self, CacheError> {
        let defaults = Self::default();
        let config = Self {
            jitter_range_secs: env_parse("CS_JITTER_RANGE_SECS")
                .unwrap_or(defaults.jitter_range_secs),
            per_beta: env_parse("CS_PER_BETA").unwrap_or(defaults.per_beta),
            per_default_delta_ms: env_parse("CS_PER_DEFAULT_DELTA_MS")
                .unwrap_or(defaults.per_default_delta_ms),
            lock_lease: env_parse("CS_LOCK_LEASE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.lock_lease),
            max_generations: env_parse("CS_MAX_GENERATIONS").unwrap_or(defaults.max_generations),
            split_unit_bits: env_parse("CS_SPLIT_UNIT_BITS").unwrap_or(defaults.split_unit_bits),
            init_chunk_bits: env_parse("CS_INIT_CHUNK_BITS").unwrap_or(defaults.init_chunk_bits),
            item_ttl: env_parse("CS_ITEM_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.item_ttl),
            null_object_ttl: env_parse("CS_NULL_OBJECT_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.null_object_ttl),
            rng_seed: env_parse("CS_RNG_SEED"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if !(self.per_beta > 0.0 && self.per_beta.is_finite()) {
            return Err(CacheError::InvalidArgument(format!(
                "per_beta must be positive, got {}",
                self.per_beta
            )));
        }
        if self.split_unit_bits == 0 {
            return Err(CacheError::InvalidArgument(
                "split_unit_bits cannot be 0".to_string(),
            ));
        }
        if self.init_chunk_bits == 0 {
            return Err(CacheError::InvalidArgument(
                "init_chunk_bits cannot be 0".to_string(),
            ));
        }
        if self.lock_lease.is_zero() {
            return Err(CacheError::InvalidArgument(
                "lock_lease cannot be 0".to_string(),
            ));
        }
        if self.item_ttl.as_secs() <= self.jitter_range_secs {
            return Err(CacheError::InvalidArgument(format!(
                "item_ttl {:?} must exceed the jitter range of {}s",
                self.item_ttl, self.jitter_range_secs
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Builder for StrategyConfig with validation
#[derive(Default)]
pub struct StrategyConfigBuilder {
    jitter_range_secs: Option<u64>,
    per_beta: Option<f64>,
    per_default_delta_ms: Option<u64>,
    lock_lease: Option<Duration>,
    max_generations: Option<u32>,
    split_unit_bits: Option<u64>,
    init_chunk_bits: Option<u64>,
    item_ttl: Option<Duration>,
    null_object_ttl: Option<Duration>,
    rng_seed: Option<u64>,
}

impl StrategyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jitter_range_secs(mut self, secs: u64) -> Self {
        self.jitter_range_secs = Some(secs);
        self
    }

    pub fn per_beta(mut self, beta: f64) -> Self {
        self.per_beta = Some(beta);
        self
    }

    pub fn per_default_delta_ms(mut self, millis: u64) -> Self {
        self.per_default_delta_ms = Some(millis);
        self
    }

    pub fn lock_lease(mut self, lease: Duration) -> Self {
        self.lock_lease = Some(lease);
        self
    }

    pub fn max_generations(mut self, max: u32) -> Self {
        self.max_generations = Some(max);
        self
    }

    pub fn split_unit_bits(mut self, bits: u64) -> Self {
        self.split_unit_bits = Some(bits);
        self
    }

    pub fn init_chunk_bits(mut self, bits: u64) -> Self {
        self.init_chunk_bits = Some(bits);
        self
    }

    pub fn item_ttl(mut self, ttl: Duration) -> Self {
        self.item_ttl = Some(ttl);
        self
    }

    pub fn null_object_ttl(mut self, ttl: Duration) -> Self {
        self.null_object_ttl = Some(ttl);
        self
    }

    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<StrategyConfig, CacheError> {
        let defaults = StrategyConfig::default();
        let config = StrategyConfig {
            jitter_range_secs: self.jitter_range_secs.unwrap_or(defaults.jitter_range_secs),
            per_beta: self.per_beta.unwrap_or(defaults.per_beta),
            per_default_delta_ms: self
                .per_default_delta_ms
                .unwrap_or(defaults.per_default_delta_ms),
            lock_lease: self.lock_lease.unwrap_or(defaults.lock_lease),
            max_generations: self.max_generations.unwrap_or(defaults.max_generations),
            split_unit_bits: self.split_unit_bits.unwrap_or(defaults.split_unit_bits),
            init_chunk_bits: self.init_chunk_bits.unwrap_or(defaults.init_chunk_bits),
            item_ttl: self.item_ttl.unwrap_or(defaults.item_ttl),
            null_object_ttl: self.null_object_ttl.unwrap_or(defaults.null_object_ttl),
            rng_seed: self.rng_seed.or(defaults.rng_seed),
        };
        config.validate()?;
        Ok(config)
    }
}
