//! Counting Bloom filters: plain counters and counters with a time-to-live.
pub mod config;
pub mod filter;
pub mod ttl;

pub use config::{
    CountingBloomFilterConfig, CountingBloomFilterConfigBuilder,
    TtlCountingBloomFilterConfig, TtlCountingBloomFilterConfigBuilder,
};
pub use filter::CountingBloomFilter;
pub use ttl::{TtlCountingBloomFilter, current_millis};
