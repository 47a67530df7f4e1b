use crate::bloom::config::validate_fpp;
use crate::error::{BloomError, Result};
use crate::hash::{HashFunction, default_hash_function};
use crate::logger::{Logger, default_logger};
use crate::sizing::{optimal_bit_set_size, optimal_num_hash_functions};
use derive_builder::Builder;
use std::sync::Arc;
use std::time::Duration;

/// Optimal `(m, k)` for `n` insertions at `fpp`.
fn optimal_shape(
    expected_insertions: usize,
    fpp: f64,
) -> Result<(usize, usize)> {
    if expected_insertions == 0 {
        return Err(BloomError::InvalidConfig(
            "expected_insertions must be > 0".into(),
        ));
    }
    validate_fpp(fpp)?;
    let m = optimal_bit_set_size(expected_insertions, fpp);
    Ok((m, optimal_num_hash_functions(expected_insertions, m)))
}

fn validate_shape(
    bit_set_size: usize,
    num_hash_functions: usize,
    max_counter_value: u32,
) -> Result<()> {
    if bit_set_size == 0 {
        return Err(BloomError::InvalidConfig(
            "bit_set_size must be > 0".into(),
        ));
    }
    if num_hash_functions == 0 {
        return Err(BloomError::InvalidConfig(
            "num_hash_functions must be > 0".into(),
        ));
    }
    if max_counter_value == 0 || max_counter_value > i32::MAX as u32 {
        return Err(BloomError::InvalidConfig(format!(
            "max_counter_value must be in 1..={}, got {max_counter_value}",
            i32::MAX
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned", build_fn(error = "crate::BloomError"))]
pub struct CountingBloomFilterConfig {
    /// Number of counters
    #[builder(default = "1_000")]
    pub bit_set_size: usize,

    #[builder(default = "4")]
    pub num_hash_functions: usize,

    /// Counters saturate at this value
    #[builder(default = "255")]
    pub max_counter_value: u32,

    #[builder(default = "0")]
    pub seed: i32,

    #[builder(default = "default_hash_function()")]
    pub hash_function: Arc<dyn HashFunction>,

    #[builder(default = "default_logger()")]
    pub logger: Arc<dyn Logger>,
}

impl CountingBloomFilterConfig {
    pub fn validate(&self) -> Result<()> {
        validate_shape(
            self.bit_set_size,
            self.num_hash_functions,
            self.max_counter_value,
        )
    }
}

impl CountingBloomFilterConfigBuilder {
    /// Derives counter count and hash count from the expected load.
    pub fn optimal_size(
        self,
        expected_insertions: usize,
        fpp: f64,
    ) -> Result<Self> {
        let (m, k) = optimal_shape(expected_insertions, fpp)?;
        Ok(self.bit_set_size(m).num_hash_functions(k))
    }
}

#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned", build_fn(error = "crate::BloomError"))]
pub struct TtlCountingBloomFilterConfig {
    #[builder(default = "1_000")]
    pub bit_set_size: usize,

    #[builder(default = "4")]
    pub num_hash_functions: usize,

    #[builder(default = "255")]
    pub max_counter_value: u32,

    #[builder(default = "0")]
    pub seed: i32,

    /// How long an untouched counter stays alive
    #[builder(default = "Duration::from_secs(3600)")]
    pub ttl: Duration,

    /// Granularity of the freshness clock
    #[builder(default = "Duration::from_secs(1)")]
    pub slice_unit: Duration,

    #[builder(default = "default_hash_function()")]
    pub hash_function: Arc<dyn HashFunction>,

    #[builder(default = "default_logger()")]
    pub logger: Arc<dyn Logger>,
}

impl TtlCountingBloomFilterConfig {
    pub fn validate(&self) -> Result<()> {
        validate_shape(
            self.bit_set_size,
            self.num_hash_functions,
            self.max_counter_value,
        )?;
        if self.ttl.as_millis() == 0 {
            return Err(BloomError::InvalidConfig(
                "ttl must be at least 1ms".into(),
            ));
        }
        let slice_unit_millis = self.slice_unit.as_millis();
        if slice_unit_millis == 0 || slice_unit_millis > i64::MAX as u128 {
            return Err(BloomError::InvalidConfig(format!(
                "slice_unit must be between 1ms and {}ms",
                i64::MAX
            )));
        }
        if self.ttl.as_millis() / slice_unit_millis > i32::MAX as u128 {
            return Err(BloomError::InvalidConfig(
                "ttl spans more than i32::MAX slices".into(),
            ));
        }
        Ok(())
    }

    pub fn slice_unit_millis(&self) -> u64 {
        self.slice_unit.as_millis() as u64
    }

    /// `max(1, ttl / slice_unit)`, whole slices only.
    pub fn ttl_slices(&self) -> u32 {
        let slices = self.ttl.as_millis() / self.slice_unit.as_millis().max(1);
        (slices as u32).max(1)
    }
}

impl TtlCountingBloomFilterConfigBuilder {
    /// Derives counter count and hash count from the expected load.
    pub fn optimal_size(
        self,
        expected_insertions: usize,
        fpp: f64,
    ) -> Result<Self> {
        let (m, k) = optimal_shape(expected_insertions, fpp)?;
        Ok(self.bit_set_size(m).num_hash_functions(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_slices_round_down_with_floor_of_one() {
        let config = TtlCountingBloomFilterConfigBuilder::default()
            .ttl(Duration::from_millis(2_500))
            .slice_unit(Duration::from_secs(1))
            .build()
            .unwrap();
        assert_eq!(config.ttl_slices(), 2);

        let config = TtlCountingBloomFilterConfigBuilder::default()
            .ttl(Duration::from_millis(300))
            .slice_unit(Duration::from_secs(1))
            .build()
            .unwrap();
        assert_eq!(config.ttl_slices(), 1);
    }

    #[test]
    fn test_optimal_size_sets_shape() {
        let config = CountingBloomFilterConfigBuilder::default()
            .optimal_size(1000, 0.01)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.bit_set_size, 9586);
        assert_eq!(config.num_hash_functions, 7);
    }

    #[test]
    fn test_optimal_size_rejects_bad_load() {
        let result = CountingBloomFilterConfigBuilder::default()
            .optimal_size(0, 0.01);
        assert!(matches!(result, Err(BloomError::InvalidConfig(_))));

        let result = TtlCountingBloomFilterConfigBuilder::default()
            .optimal_size(10, 1.0);
        assert!(matches!(result, Err(BloomError::InvalidConfig(_))));
    }
}
