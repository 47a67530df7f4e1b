//! Standard Bloom Filter implementation
pub mod config;
pub mod filter;

pub use config::{BloomFilterConfig, BloomFilterConfigBuilder, FilterParams};
pub use filter::BloomFilter;
