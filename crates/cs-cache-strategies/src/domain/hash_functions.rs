//! Hash functions for Bloom filters and shard selection
//!
//! Bit offsets use MurmurHash3 (x64, 128-bit) with two seeds for double
//! hashing. Shard selection uses SipHash-1-3 with fixed keys so the choice
//! is identical across processes and releases.

use std::hash::Hasher;
use std::io::Cursor;

use siphasher::sip::SipHasher13;

/// Hash an element with MurmurHash3 using a seed
pub fn murmur_hash(element: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(element);

    // Reading from an in-memory cursor cannot fail
    let hash = murmur3::murmur3_x64_128(&mut cursor, seed).unwrap_or(0);
    hash as u64
}

/// Compute k bit positions in `[0, m)` for an element
///
/// Uses double hashing: index_i = (h1 + i * h2) mod m
pub fn compute_hash_positions(element: &[u8], k: usize, m: u64) -> Vec<u64> {
    let h1 = murmur_hash(element, 0);
    let h2 = murmur_hash(element, 1);

    (0..k)
        .map(|i| {
            let hash = h1.wrapping_add((i as u64).wrapping_mul(h2));
            hash % m
        })
        .collect()
}

/// Stable hash used to pick a shard
pub fn shard_hash(element: &[u8]) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write(element);
    hasher.finish()
}
