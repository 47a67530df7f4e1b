use super::strategy::{BuiltinGrowthStrategy, GrowthStrategy};
use crate::bloom::config::validate_fpp;
use crate::error::{BloomError, Result};
use crate::hash::{HashFunction, default_hash_function};
use crate::logger::{Logger, default_logger};
use derive_builder::Builder;
use std::sync::Arc;

fn default_growth_strategy() -> Arc<dyn GrowthStrategy> {
    Arc::new(BuiltinGrowthStrategy::Default)
}

#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned", build_fn(error = "crate::BloomError"))]
pub struct ScalableBloomFilterConfig {
    /// Sizes the first member filter and the growth trigger
    #[builder(default = "1_000")]
    pub initial_expected_insertions: usize,

    /// Target false positive probability of the first member filter
    #[builder(default = "0.01")]
    pub false_positive_probability: f64,

    #[builder(default = "0")]
    pub seed: i32,

    #[builder(default = "default_growth_strategy()")]
    pub growth_strategy: Arc<dyn GrowthStrategy>,

    #[builder(default = "default_hash_function()")]
    pub hash_function: Arc<dyn HashFunction>,

    #[builder(default = "default_logger()")]
    pub logger: Arc<dyn Logger>,
}

impl ScalableBloomFilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_expected_insertions == 0
            || self.initial_expected_insertions > i32::MAX as usize
        {
            return Err(BloomError::InvalidConfig(format!(
                "initial_expected_insertions must be in 1..={}, got {}",
                i32::MAX,
                self.initial_expected_insertions
            )));
        }
        validate_fpp(self.false_positive_probability)?;
        if self.growth_strategy.name().is_empty() {
            return Err(BloomError::InvalidConfig(
                "growth strategy name must not be empty".into(),
            ));
        }
        Ok(())
    }
}
