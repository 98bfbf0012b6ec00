//! Optimal Bloom filter parameter derivation
//!
//! Formulas:
//! - m = ceil(-n*ln(p) / (ln(2)^2))  -- optimal bits
//! - k = round((m/n) * ln(2))        -- optimal hash functions
//! - FPR = (1 - e^(-kn/m))^k         -- expected false positive rate

use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};

use super::hash_functions::compute_hash_positions;
use crate::error::FilterError;

/// Bloom filter descriptor.
///
/// Immutable once created: `bit_size` and `hash_function_count` are pure
/// functions of `(data_count, false_positive_rate)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BloomFilterParams {
    id: String,
    data_count: u64,
    false_positive_rate: f64,
    bit_size: u64,
    hash_function_count: u32,
}

impl BloomFilterParams {
    /// Derive the optimal `(m, k)` for `n` expected items at target rate `p`.
    ///
    /// # Errors
    /// `InvalidArgument` if `n == 0` or `p` is not strictly inside `(0, 1)`.
    pub fn create(
        id: impl Into<String>,
        data_count: u64,
        false_positive_rate: f64,
    ) -> Result<Self, FilterError> {
        if data_count == 0 {
            return Err(FilterError::InvalidArgument(
                "data_count must be greater than 0".to_string(),
            ));
        }
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(FilterError::InvalidArgument(format!(
                "false_positive_rate must be in (0, 1), got {}",
                false_positive_rate
            )));
        }

        let bit_size = optimal_bit_size(data_count, false_positive_rate);
        let hash_function_count = optimal_hash_count(bit_size, data_count);

        Ok(Self {
            id: id.into(),
            data_count,
            false_positive_rate,
            bit_size,
            hash_function_count,
        })
    }

    /// Map a value to exactly `k` bit offsets in `[0, m)`.
    pub fn hash(&self, value: &str) -> Vec<u64> {
        compute_hash_positions(
            value.as_bytes(),
            self.hash_function_count as usize,
            self.bit_size,
        )
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

    pub fn bit_size(&self) -> u64 {
        self.bit_size
    }

    pub fn hash_function_count(&self) -> u32 {
        self.hash_function_count
    }

    /// Expected false positive rate once `data_count` items are inserted
    pub fn expected_fpr(&self) -> f64 {
        calculate_fpr(
            self.bit_size,
            self.data_count,
            self.hash_function_count as u64,
        )
    }
}

/// m = ceil(-n * ln(p) / (ln(2)^2))
pub fn optimal_bit_size(n: u64, p: f64) -> u64 {
    let ln2_squared = LN_2 * LN_2;
    let m = (-(n as f64) * p.ln() / ln2_squared).ceil() as u64;
    m.max(1)
}

/// k = round((m/n) * ln(2)), at least 1
pub fn optimal_hash_count(m: u64, n: u64) -> u32 {
    if n == 0 {
        return 1;
    }
    let k = ((m as f64 / n as f64) * LN_2).round() as u32;
    k.max(1)
}

/// Calculate the false positive rate for given parameters
///
/// Formula: FPR = (1 - e^(-kn/m))^k
pub fn calculate_fpr(m: u64, n: u64, k: u64) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_create_n1000_p001() {
        let params = BloomFilterParams::create("testId1", 1000, 0.01).unwrap();

        assert_eq!(params.id(), "testId1");
        assert_eq!(params.data_count(), 1000);
        assert_eq!(params.false_positive_rate(), 0.01);
        assert_eq!(params.bit_size(), 9586);
        assert_eq!(params.hash_function_count(), 7);
    }

    #[test]
    fn test_create_n100m_p001() {
        let params = BloomFilterParams::create("testId2", 100_000_000, 0.01).unwrap();

        assert_eq!(params.bit_size(), 958_505_838);
        assert_eq!(params.hash_function_count(), 7);
    }

    #[test]
    fn test_create_rejects_zero_data_count() {
        let result = BloomFilterParams::create("id", 0, 0.01);
        assert!(matches!(result, Err(FilterError::InvalidArgument(_))));
    }

    #[test]
    fn test_create_rejects_rate_outside_open_interval() {
        for p in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let result = BloomFilterParams::create("id", 100, p);
            assert!(
                matches!(result, Err(FilterError::InvalidArgument(_))),
                "p={} should be rejected",
                p
            );
        }
    }

    #[test]
    fn test_hash_count_never_below_one() {
        // p close to 1 gives m/n * ln2 < 0.5
        let params = BloomFilterParams::create("id", 1000, 0.9).unwrap();
        assert_eq!(params.hash_function_count(), 1);
    }

    #[test]
    fn test_hash_returns_k_offsets_in_range() {
        let params = BloomFilterParams::create("testId", 1000, 0.01).unwrap();

        for i in 0..100 {
            let offsets = params.hash(&format!("value{}", i));
            assert_eq!(offsets.len(), params.hash_function_count() as usize);
            for offset in offsets {
                assert!(offset < params.bit_size());
            }
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let params = BloomFilterParams::create("testId", 1000, 0.01).unwrap();
        assert_eq!(params.hash("value"), params.hash("value"));
    }

    #[test]
    fn test_expected_fpr_meets_target() {
        let params = BloomFilterParams::create("id", 1000, 0.01).unwrap();
        assert!(
            params.expected_fpr() <= 0.01 * 1.1,
            "Expected FPR {} should be near target",
            params.expected_fpr()
        );
    }

    #[test]
    fn test_lower_fpr_needs_more_bits() {
        let loose = BloomFilterParams::create("a", 100, 0.1).unwrap();
        let tight = BloomFilterParams::create("b", 100, 0.01).unwrap();
        assert!(tight.bit_size() > loose.bit_size());
    }

    proptest! {
        #[test]
        fn prop_formula_holds(n in 1u64..10_000_000, p in 0.0001f64..0.5) {
            let params = BloomFilterParams::create("p", n, p).unwrap();
            let expected_m = (-(n as f64) * p.ln() / (LN_2 * LN_2)).ceil() as u64;
            prop_assert_eq!(params.bit_size(), expected_m.max(1));
            let expected_k = (((expected_m as f64) / n as f64) * LN_2).round() as u32;
            prop_assert_eq!(params.hash_function_count(), expected_k.max(1));
        }

        #[test]
        fn prop_hash_offsets_in_range(n in 1u64..100_000, value in ".{0,32}") {
            let params = BloomFilterParams::create("p", n, 0.01).unwrap();
            let offsets = params.hash(&value);
            prop_assert_eq!(offsets.len(), params.hash_function_count() as usize);
            prop_assert!(offsets.iter().all(|o| *o < params.bit_size()));
        }
    }
}
