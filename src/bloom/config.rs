use crate::error::{BloomError, Result};
use crate::hash::{HashFunction, default_hash_function};
use crate::logger::{Logger, default_logger};
use crate::sizing::{optimal_bit_set_size, optimal_num_hash_functions};
use derive_builder::Builder;
use std::sync::Arc;

#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned", build_fn(error = "crate::BloomError"))]
pub struct BloomFilterConfig {
    /// Number of elements the filter is sized for
    #[builder(default = "1_000")]
    pub expected_insertions: usize,

    /// Target false positive probability, strictly between 0 and 1
    #[builder(default = "0.01")]
    pub false_positive_probability: f64,

    #[builder(default = "0")]
    pub seed: i32,

    /// Overrides the derived hash function count when set
    #[builder(default, setter(strip_option))]
    pub num_hash_functions: Option<usize>,

    #[builder(default = "default_hash_function()")]
    pub hash_function: Arc<dyn HashFunction>,

    #[builder(default = "default_logger()")]
    pub logger: Arc<dyn Logger>,
}

impl BloomFilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.expected_insertions == 0 {
            return Err(BloomError::InvalidConfig(
                "expected_insertions must be > 0".into(),
            ));
        }
        validate_fpp(self.false_positive_probability)?;
        if self.num_hash_functions == Some(0) {
            return Err(BloomError::InvalidConfig(
                "num_hash_functions must be > 0".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_fpp(fpp: f64) -> Result<()> {
    if !(fpp > 0.0 && fpp < 1.0) {
        return Err(BloomError::InvalidConfig(format!(
            "false_positive_probability must be in (0, 1), got {fpp}"
        )));
    }
    Ok(())
}

/// Immutable sizing of a single bit-array filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    pub bit_set_size: usize,
    pub num_hash_functions: usize,
    pub seed: i32,
    pub false_positive_probability: f64,
}

impl FilterParams {
    pub fn new(
        bit_set_size: usize,
        num_hash_functions: usize,
        seed: i32,
        false_positive_probability: f64,
    ) -> Self {
        Self {
            bit_set_size,
            num_hash_functions,
            seed,
            false_positive_probability,
        }
    }

    /// Optimal `m` and `k` for `n` insertions at `fpp`.
    pub fn optimal(n: usize, fpp: f64, seed: i32) -> Self {
        let bit_set_size = optimal_bit_set_size(n, fpp);
        let num_hash_functions = optimal_num_hash_functions(n, bit_set_size);
        Self::new(bit_set_size, num_hash_functions, seed, fpp)
    }

    /// Structural check: `m` and `k` must be positive.
    pub fn validate_shape(&self) -> Result<()> {
        if self.bit_set_size == 0 {
            return Err(BloomError::InvalidConfig(
                "bit_set_size must be > 0".into(),
            ));
        }
        if self.num_hash_functions == 0 {
            return Err(BloomError::InvalidConfig(
                "num_hash_functions must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_shape()?;
        validate_fpp(self.false_positive_probability)
    }
}

impl From<&BloomFilterConfig> for FilterParams {
    fn from(config: &BloomFilterConfig) -> Self {
        let mut params = Self::optimal(
            config.expected_insertions,
            config.false_positive_probability,
            config.seed,
        );
        if let Some(k) = config.num_hash_functions {
            params.num_hash_functions = k;
        }
        params
    }
}
