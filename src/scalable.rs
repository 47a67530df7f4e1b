//! Scalable Bloom filter and its growth policies.
pub mod config;
pub mod filter;
pub mod strategy;

pub use config::{ScalableBloomFilterConfig, ScalableBloomFilterConfigBuilder};
pub use filter::{OVER_CAPACITY_THRESHOLD, ScalableBloomFilter};
pub use strategy::{
    BuiltinGrowthStrategy, GrowthStrategy, GrowthStrategyRegistry,
};
