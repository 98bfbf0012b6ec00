//! Cache record for probabilistic early recomputation (PER)
//!
//! Stores the serialized payload next to the cost of the last
//! recomputation (`delta`) and the logical expiry. A fresh record is
//! written on every recomputation; records are never mutated in place.
//!
//! Recompute iff `now - delta * beta * ln(rand) >= expiry`, with `rand`
//! uniform in (0, 1). Since `ln(rand) < 0`, the left side is `now` pushed
//! forward by a random amount that scales with `delta` and `beta`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheData {
    /// Serialized payload
    data: String,
    /// Wall-clock cost of the recomputation that produced `data` (delta)
    computation_time_millis: u64,
    /// Logical expiry, epoch millis
    expired_at_millis: u64,
}

impl CacheData {
    /// Build a record expiring `ttl_millis` after `now_millis`
    pub fn new(
        data: String,
        computation_time_millis: u64,
        now_millis: u64,
        ttl_millis: u64,
    ) -> Self {
        Self {
            data,
            computation_time_millis,
            expired_at_millis: now_millis.saturating_add(ttl_millis),
        }
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn computation_time_millis(&self) -> u64 {
        self.computation_time_millis
    }

    pub fn expired_at_millis(&self) -> u64 {
        self.expired_at_millis
    }

    /// PER trigger for a given draw `rand` in (0, 1)
    pub fn should_recompute(&self, now_millis: u64, beta: f64, rand: f64) -> bool {
        should_recompute(
            now_millis,
            self.computation_time_millis,
            beta,
            rand,
            self.expired_at_millis,
        )
    }
}

/// `now - delta * beta * ln(rand) >= expiry`
pub fn should_recompute(
    now_millis: u64,
    delta_millis: u64,
    beta: f64,
    rand: f64,
    expired_at_millis: u64,
) -> bool {
    let shifted = now_millis as f64 - delta_millis as f64 * beta * rand.ln();
    shifted >= expired_at_millis as f64
}
