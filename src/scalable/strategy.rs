//! Growth policies for [`ScalableBloomFilter`](super::ScalableBloomFilter).
//!
//! A policy maps the parameters of the active member filter to those of the
//! next one. Policies are identified by a stable name, which is what the
//! persisted formats store, and are looked up again through a
//! [`GrowthStrategyRegistry`] on restore.
use crate::bloom::FilterParams;
use crate::error::{BloomError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Size multiplier applied by the doubling policies.
pub const GROWTH_FACTOR: usize = 2;

/// Ratio applied to `k` (and `fpp` when tightening) each generation.
pub const TIGHTENING_RATIO: f64 = 0.9;

pub trait GrowthStrategy: fmt::Debug + Send + Sync {
    /// Stable identifier written into persisted scalable filters.
    fn name(&self) -> &str;

    fn next_bit_set_size(&self, previous: &FilterParams) -> usize;

    fn next_num_hash_functions(&self, previous: &FilterParams) -> usize;

    fn next_fpp(&self, previous_fpp: f64) -> f64;

    /// Parameters of the next member filter. The seed is inherited.
    fn next_params(&self, previous: &FilterParams) -> FilterParams {
        FilterParams::new(
            self.next_bit_set_size(previous),
            self.next_num_hash_functions(previous),
            previous.seed,
            self.next_fpp(previous.false_positive_probability),
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BuiltinGrowthStrategy {
    /// Doubles `m`, rounds `k × 0.9`, keeps `fpp`.
    #[default]
    Default,
    /// Doubles `m`, keeps `k` and `fpp`.
    Geometric,
    /// Keeps `m`, truncates `k × 0.9`, multiplies `fpp` by 0.9.
    Tightening,
}

impl BuiltinGrowthStrategy {
    pub const ALL: [Self; 3] =
        [Self::Default, Self::Geometric, Self::Tightening];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Geometric => "geometric",
            Self::Tightening => "tightening",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl GrowthStrategy for BuiltinGrowthStrategy {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn next_bit_set_size(&self, previous: &FilterParams) -> usize {
        match self {
            Self::Default | Self::Geometric => {
                previous.bit_set_size.saturating_mul(GROWTH_FACTOR)
            }
            Self::Tightening => previous.bit_set_size,
        }
    }

    fn next_num_hash_functions(&self, previous: &FilterParams) -> usize {
        let k = previous.num_hash_functions as f64 * TIGHTENING_RATIO;
        let next = match self {
            Self::Default => k.round() as usize,
            Self::Geometric => previous.num_hash_functions,
            Self::Tightening => k as usize,
        };
        next.max(1)
    }

    fn next_fpp(&self, previous_fpp: f64) -> f64 {
        match self {
            Self::Default | Self::Geometric => previous_fpp,
            Self::Tightening => previous_fpp * TIGHTENING_RATIO,
        }
    }
}

/// Name-keyed lookup of growth strategies, pre-filled with the built-ins.
#[derive(Clone, Debug)]
pub struct GrowthStrategyRegistry {
    strategies: HashMap<String, Arc<dyn GrowthStrategy>>,
}

impl Default for GrowthStrategyRegistry {
    fn default() -> Self {
        let strategies = BuiltinGrowthStrategy::ALL
            .into_iter()
            .map(|s| {
                (s.as_str().to_string(), Arc::new(s) as Arc<dyn GrowthStrategy>)
            })
            .collect();
        Self { strategies }
    }
}

impl GrowthStrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `strategy` under its own name, returning any strategy it
    /// replaced.
    pub fn register(
        &mut self,
        strategy: Arc<dyn GrowthStrategy>,
    ) -> Option<Arc<dyn GrowthStrategy>> {
        self.strategies.insert(strategy.name().to_string(), strategy)
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn GrowthStrategy>> {
        self.strategies.get(name).cloned().ok_or_else(|| {
            BloomError::Deserialization(format!(
                "Unknown or unregistered growth strategy: {name}"
            ))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> =
            self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(m: usize, k: usize, fpp: f64) -> FilterParams {
        FilterParams::new(m, k, 11, fpp)
    }

    #[test]
    fn test_default_doubles_and_rounds_k() {
        let next =
            BuiltinGrowthStrategy::Default.next_params(&params(1000, 7, 0.01));
        assert_eq!(next.bit_set_size, 2000);
        assert_eq!(next.num_hash_functions, 6); // round(6.3)
        assert_eq!(next.false_positive_probability, 0.01);
        assert_eq!(next.seed, 11);

        let next =
            BuiltinGrowthStrategy::Default.next_params(&params(10, 5, 0.1));
        assert_eq!(next.num_hash_functions, 5); // round(4.5)
    }

    #[test]
    fn test_geometric_only_grows_size() {
        let next = BuiltinGrowthStrategy::Geometric
            .next_params(&params(1000, 7, 0.01));
        assert_eq!(next, params(2000, 7, 0.01));
    }

    #[test]
    fn test_tightening_keeps_size_and_shrinks_k_and_fpp() {
        let next = BuiltinGrowthStrategy::Tightening
            .next_params(&params(1000, 7, 0.01));
        assert_eq!(next.bit_set_size, 1000);
        assert_eq!(next.num_hash_functions, 6); // trunc(6.3)
        assert!((next.false_positive_probability - 0.009).abs() < 1e-12);
    }

    #[test]
    fn test_k_never_drops_below_one() {
        for strategy in BuiltinGrowthStrategy::ALL {
            let next = strategy.next_params(&params(64, 1, 0.5));
            assert_eq!(next.num_hash_functions, 1, "{strategy:?}");
        }
    }

    #[test]
    fn test_names_are_stable_and_resolvable() {
        let registry = GrowthStrategyRegistry::new();
        assert_eq!(
            registry.names(),
            vec!["default", "geometric", "tightening"]
        );
        for strategy in BuiltinGrowthStrategy::ALL {
            assert_eq!(
                BuiltinGrowthStrategy::from_name(strategy.as_str()),
                Some(strategy)
            );
            assert_eq!(
                registry.resolve(strategy.name()).unwrap().name(),
                strategy.name()
            );
        }
        assert!(matches!(
            registry.resolve("com.example.Missing"),
            Err(BloomError::Deserialization(_))
        ));
    }

    #[derive(Debug)]
    struct Tripling;

    impl GrowthStrategy for Tripling {
        fn name(&self) -> &str {
            "tripling"
        }

        fn next_bit_set_size(&self, previous: &FilterParams) -> usize {
            previous.bit_set_size * 3
        }

        fn next_num_hash_functions(&self, previous: &FilterParams) -> usize {
            previous.num_hash_functions
        }

        fn next_fpp(&self, previous_fpp: f64) -> f64 {
            previous_fpp
        }
    }

    #[test]
    fn test_custom_strategy_registration() {
        let mut registry = GrowthStrategyRegistry::new();
        assert!(!registry.contains("tripling"));
        assert!(registry.register(Arc::new(Tripling)).is_none());

        let strategy = registry.resolve("tripling").unwrap();
        assert_eq!(strategy.next_params(&params(10, 2, 0.1)).bit_set_size, 30);
        assert!(registry.register(Arc::new(Tripling)).is_some());
    }
}
