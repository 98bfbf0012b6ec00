//! TTL jitter
//!
//! Randomizing expiry across keys cached at the same moment decorrelates
//! their expiry-driven recomputation without any locking.

use std::time::Duration;

use rand::Rng;

use crate::error::CacheError;

/// Default half-range of the jitter window, in seconds
pub const DEFAULT_JITTER_RANGE_SECS: u64 = 3;

/// `ttl + U[-range, +range]` seconds, inclusive on both ends.
///
/// # Errors
/// `InvalidArgument` unless `ttl` is strictly longer than `range_secs`
/// seconds, which keeps the effective TTL positive. Sub-second TTLs are
/// compared exactly, so 3.5 s passes a 3 s range.
pub fn apply_jitter<R: Rng + ?Sized>(
    ttl: Duration,
    range_secs: u64,
    rng: &mut R,
) -> Result<Duration, CacheError> {
    if ttl <= Duration::from_secs(range_secs) {
        return Err(CacheError::InvalidArgument(format!(
            "Jitter ttl must be greater than {} seconds, got {:?}",
            range_secs, ttl
        )));
    }

    let range = range_secs as i64;
    let jitter = rng.gen_range(-range..=range);
    let jittered = if jitter >= 0 {
        ttl + Duration::from_secs(jitter as u64)
    } else {
        ttl - Duration::from_secs(jitter.unsigned_abs())
    };
    Ok(jittered)
}
