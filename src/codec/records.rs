//! Plain data records mirroring each binary layout field for field.
//!
//! Integers stay 32-bit signed as on the wire; `check` rejects anything the
//! filters cannot be rebuilt from.
use crate::error::{BloomError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BloomFilterData {
    pub bit_set_size: i32,
    pub num_hash_functions: i32,
    pub seed: i32,
    pub false_positive_probability: f64,
    pub bit_array: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingBloomFilterData {
    pub bit_set_size: i32,
    pub num_hash_functions: i32,
    pub max_counter_value: i32,
    pub seed: i32,
    pub counters: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlCountingBloomFilterData {
    pub bit_set_size: i32,
    pub num_hash_functions: i32,
    pub max_counter_value: i32,
    pub seed: i32,
    pub ttl_slices: i32,
    pub slice_unit_millis: i64,
    pub counters: Vec<i32>,
    pub last_update_slices: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalableBloomFilterData {
    pub initial_expected_insertions: i32,
    pub false_positive_probability: f64,
    pub seed: i32,
    /// Registry name of the growth strategy
    pub growth_strategy: String,
    pub filters: Vec<BloomFilterData>,
}

fn invalid(message: String) -> BloomError {
    BloomError::Deserialization(message)
}

fn require_positive(value: i64, field: &str) -> Result<()> {
    if value <= 0 {
        return Err(invalid(format!("{field} must be > 0, got {value}")));
    }
    Ok(())
}

fn require_len(actual: usize, expected: usize, field: &str) -> Result<()> {
    if actual != expected {
        return Err(invalid(format!(
            "{field} length mismatch: expected {expected}, got {actual}"
        )));
    }
    Ok(())
}

fn check_counters(counters: &[i32]) -> Result<()> {
    if let Some(negative) = counters.iter().find(|&&c| c < 0) {
        return Err(invalid(format!("Negative counter value: {negative}")));
    }
    Ok(())
}

impl BloomFilterData {
    pub(crate) fn check(&self) -> Result<()> {
        require_positive(self.bit_set_size.into(), "bit_set_size")?;
        require_positive(self.num_hash_functions.into(), "num_hash_functions")?;
        // JSON has no encoding for NaN or infinity
        let fpp = self.false_positive_probability;
        if !fpp.is_finite() {
            return Err(invalid(format!(
                "false_positive_probability must be finite, got {fpp}"
            )));
        }
        require_len(
            self.bit_array.len(),
            (self.bit_set_size as usize).div_ceil(64),
            "bit_array",
        )
    }
}

impl CountingBloomFilterData {
    pub(crate) fn check(&self) -> Result<()> {
        require_positive(self.bit_set_size.into(), "bit_set_size")?;
        require_positive(self.num_hash_functions.into(), "num_hash_functions")?;
        require_positive(self.max_counter_value.into(), "max_counter_value")?;
        require_len(
            self.counters.len(),
            self.bit_set_size as usize,
            "counters",
        )?;
        check_counters(&self.counters)
    }
}

impl TtlCountingBloomFilterData {
    pub(crate) fn check(&self) -> Result<()> {
        require_positive(self.bit_set_size.into(), "bit_set_size")?;
        require_positive(self.num_hash_functions.into(), "num_hash_functions")?;
        require_positive(self.max_counter_value.into(), "max_counter_value")?;
        require_positive(self.ttl_slices.into(), "ttl_slices")?;
        require_positive(self.slice_unit_millis, "slice_unit_millis")?;
        let m = self.bit_set_size as usize;
        require_len(self.counters.len(), m, "counters")?;
        require_len(self.last_update_slices.len(), m, "last_update_slices")?;
        check_counters(&self.counters)
    }
}

impl ScalableBloomFilterData {
    pub(crate) fn check(&self) -> Result<()> {
        require_positive(
            self.initial_expected_insertions.into(),
            "initial_expected_insertions",
        )?;
        let fpp = self.false_positive_probability;
        if !(fpp > 0.0 && fpp < 1.0) {
            return Err(invalid(format!(
                "false_positive_probability must be in (0, 1), got {fpp}"
            )));
        }
        if self.growth_strategy.is_empty() {
            return Err(invalid("Missing growth strategy name".into()));
        }
        if self.filters.is_empty() {
            return Err(invalid("Expected at least 1 member filter".into()));
        }
        for (i, filter) in self.filters.iter().enumerate() {
            filter.check().map_err(|e| {
                invalid(format!("Member filter {i} is invalid: {e}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_record() -> CountingBloomFilterData {
        CountingBloomFilterData {
            bit_set_size: 4,
            num_hash_functions: 2,
            max_counter_value: 3,
            seed: 0,
            counters: vec![0, 1, 2, 3],
        }
    }

    #[test]
    fn test_plain_word_count_must_match_size() {
        let record = BloomFilterData {
            bit_set_size: 65,
            num_hash_functions: 1,
            seed: 0,
            false_positive_probability: 0.5,
            bit_array: vec![0],
        };
        assert!(matches!(
            record.check(),
            Err(BloomError::Deserialization(msg)) if msg.contains("bit_array")
        ));
    }

    #[test]
    fn test_plain_fpp_must_be_finite() {
        for fpp in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let record = BloomFilterData {
                bit_set_size: 64,
                num_hash_functions: 1,
                seed: 0,
                false_positive_probability: fpp,
                bit_array: vec![0],
            };
            assert!(matches!(
                record.check(),
                Err(BloomError::Deserialization(msg))
                    if msg.contains("false_positive_probability")
            ));
        }
    }

    #[test]
    fn test_counting_record_checks() {
        assert!(counting_record().check().is_ok());

        let mut short = counting_record();
        short.counters.pop();
        assert!(short.check().is_err());

        let mut negative = counting_record();
        negative.counters[0] = -1;
        assert!(negative.check().is_err());

        let mut no_max = counting_record();
        no_max.max_counter_value = 0;
        assert!(no_max.check().is_err());
    }

    #[test]
    fn test_scalable_record_requires_members() {
        let record = ScalableBloomFilterData {
            initial_expected_insertions: 10,
            false_positive_probability: 0.1,
            seed: 0,
            growth_strategy: "default".into(),
            filters: Vec::new(),
        };
        assert!(record.check().is_err());
    }
}
