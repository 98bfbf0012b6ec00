//! Metrics hooks for cache handlers and filter services
//!
//! Counts hits, misses, refreshes, fallbacks and filter activity so the
//! effect of each strategy can be observed.
//!
//! ## Usage
//!
//! ```ignore
//! use cs_cache_strategies::metrics::{CacheMetrics, MetricsRecorder};
//!
//! let metrics = Arc::new(CacheMetrics::new());
//! let handler = JitterCacheHandler::new(store, &config).with_metrics(metrics.clone());
//!
//! // ... serve traffic ...
//! println!("hit ratio: {:.2}", metrics.hit_ratio());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for cache and filter activity
///
/// Thread-safe; every counter is a relaxed atomic.
#[derive(Default)]
pub struct CacheMetrics {
    /// Reads answered from the cache
    pub hits: AtomicU64,
    /// Reads that found nothing usable and called the data source
    pub misses: AtomicU64,
    /// Values written back after a data-source call
    pub refreshes: AtomicU64,
    /// PER recomputations triggered before hard expiry
    pub early_refreshes: AtomicU64,
    /// Cache-layer failures that degraded to a direct data-source call
    pub fallbacks: AtomicU64,
    /// Lookups rejected by a membership filter
    pub filter_rejections: AtomicU64,
    /// Sub-filter generations appended
    pub generations_created: AtomicU64,
    /// Sub-filter chains whose last generation filled up
    pub growth_limits_reached: AtomicU64,
    /// Growth attempts that failed after the value was inserted
    pub growth_failures: AtomicU64,
    /// Lock acquisitions lost to another holder
    pub lock_contentions: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            early_refreshes: self.early_refreshes.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            filter_rejections: self.filter_rejections.load(Ordering::Relaxed),
            generations_created: self.generations_created.load(Ordering::Relaxed),
            growth_limits_reached: self.growth_limits_reached.load(Ordering::Relaxed),
            growth_failures: self.growth_failures.load(Ordering::Relaxed),
            lock_contentions: self.lock_contentions.load(Ordering::Relaxed),
        }
    }

    /// hits / (hits + misses); 0 before any read
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed);
        if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.refreshes.store(0, Ordering::Relaxed);
        self.early_refreshes.store(0, Ordering::Relaxed);
        self.fallbacks.store(0, Ordering::Relaxed);
        self.filter_rejections.store(0, Ordering::Relaxed);
        self.generations_created.store(0, Ordering::Relaxed);
        self.growth_limits_reached.store(0, Ordering::Relaxed);
        self.growth_failures.store(0, Ordering::Relaxed);
        self.lock_contentions.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub refreshes: u64,
    pub early_refreshes: u64,
    pub fallbacks: u64,
    pub filter_rejections: u64,
    pub generations_created: u64,
    pub growth_limits_reached: u64,
    pub growth_failures: u64,
    pub lock_contentions: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to forward counters to an external metrics system.
pub trait MetricsRecorder: Send + Sync {
    fn record_hit(&self);

    fn record_miss(&self);

    fn record_refresh(&self);

    /// PER triggered a recomputation before expiry
    fn record_early_refresh(&self);

    fn record_fallback(&self);

    fn record_filter_rejection(&self);

    fn record_generation_created(&self);

    fn record_growth_limit_reached(&self);

    fn record_growth_failure(&self);

    fn record_lock_contention(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_hit(&self) {}
    fn record_miss(&self) {}
    fn record_refresh(&self) {}
    fn record_early_refresh(&self) {}
    fn record_fallback(&self) {}
    fn record_filter_rejection(&self) {}
    fn record_generation_created(&self) {}
    fn record_growth_limit_reached(&self) {}
    fn record_growth_failure(&self) {}
    fn record_lock_contention(&self) {}
}

impl MetricsRecorder for CacheMetrics {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_early_refresh(&self) {
        self.early_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    fn record_filter_rejection(&self) {
        self.filter_rejections.fetch_add(1, Ordering::Relaxed);
    }

    fn record_generation_created(&self) {
        self.generations_created.fetch_add(1, Ordering::Relaxed);
    }

    fn record_growth_limit_reached(&self) {
        self.growth_limits_reached.fetch_add(1, Ordering::Relaxed);
    }

    fn record_growth_failure(&self) {
        self.growth_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_lock_contention(&self) {
        self.lock_contentions.fetch_add(1, Ordering::Relaxed);
    }
}
