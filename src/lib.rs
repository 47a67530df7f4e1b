//! Space-efficient probabilistic set membership.
//!
//! Four filter families share one hashing scheme and one set of persistence
//! formats:
//!
//!  * [`BloomFilter`]: classic bit-array filter, insert and query only.
//!  * [`CountingBloomFilter`]: saturating counters, supports removal and a
//!    per-element count estimate.
//!  * [`TtlCountingBloomFilter`]: counting filter whose counters expire after
//!    a time-to-live measured in coarse time slices. Expiry is lazy: the
//!    accessor that touches a stale counter resets it.
//!  * [`ScalableBloomFilter`]: a growing chain of Bloom filters. When the
//!    active member reaches 75% of the initial load a new, larger member is
//!    appended according to a [`GrowthStrategy`].
//!
//! HowTo:
//!    * Elements: every filter is generic over `T: ?Sized` and hashes the
//!      bytes produced by an injected [`ToBytes`] projection (see
//!      [`to_bytes`] for ready-made ones).
//!    * Indexing: round `i` of `k` hashes the bytes with seed `seed + i` and
//!      folds the 32-bit result into `[0, m)` by masking the sign bit.
//!    * Persistence: `serialize(format)` / `deserialize(bytes, format, ..)`
//!      with [`SerializationFormat::Binary`] (big-endian, byte exact),
//!      [`SerializationFormat::Json`] or [`SerializationFormat::Compact`]
//!      (CBOR).
//!
//! Nothing here is internally synchronized. Wrap a filter in a `Mutex` (or
//! give each writer its own instance) when it is shared between threads.
pub mod bitarray;
pub mod bloom;
pub mod codec;
pub mod common;
pub mod counting;
mod error;
pub mod hash;
pub mod logger;
pub mod metrics;
pub mod scalable;
pub mod sizing;
pub mod to_bytes;
pub mod traits;

pub use bloom::{
    BloomFilter, BloomFilterConfig, BloomFilterConfigBuilder, FilterParams,
};
pub use codec::{
    BloomFilterData, CountingBloomFilterData, ScalableBloomFilterData,
    SerializationFormat, TtlCountingBloomFilterData,
};
pub use counting::{
    CountingBloomFilter, CountingBloomFilterConfig,
    CountingBloomFilterConfigBuilder, TtlCountingBloomFilter,
    TtlCountingBloomFilterConfig, TtlCountingBloomFilterConfigBuilder,
};
pub use error::{BloomError, Result};
pub use hash::{HashFunction, Murmur3, XxHash32};
pub use logger::{Logger, NoOpLogger, TracingLogger};
pub use metrics::{
    BloomFilterMetrics, CountingBloomFilterMetrics, ScalableBloomFilterMetrics,
    TtlCountingBloomFilterMetrics,
};
pub use scalable::{
    BuiltinGrowthStrategy, GrowthStrategy, GrowthStrategyRegistry,
    ScalableBloomFilter, ScalableBloomFilterConfig,
    ScalableBloomFilterConfigBuilder,
};
pub use to_bytes::ToBytes;
pub use traits::BloomFilterStats;
