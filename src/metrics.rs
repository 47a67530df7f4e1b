//! Point-in-time metric snapshots with human-readable reports.
//!
//! Snapshots are plain values: take one, log it with `{}` or ship it as JSON
//! through its `Serialize` impl. Nothing here keeps a reference to the
//! filter it was computed from.
use crate::bloom::BloomFilter;
use crate::common::{bytes2hr, ratio2hr};
use crate::counting::{
    CountingBloomFilter, TtlCountingBloomFilter, current_millis,
};
use crate::error::Result;
use crate::scalable::ScalableBloomFilter;
use crate::traits::BloomFilterStats;
use serde::Serialize;
use std::fmt;

fn elements(estimate: f64) -> u64 {
    // saturating cast, infinity becomes u64::MAX
    estimate as u64
}

fn per_element(counter_sum: u64, num_hash_functions: usize) -> u64 {
    counter_sum / num_hash_functions.max(1) as u64
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BloomFilterMetrics {
    pub bit_set_size: usize,
    pub num_hash_functions: usize,
    pub memory_usage_bytes: u64,
    pub current_fpp: f64,
    pub fill_ratio: f64,
    /// Derived from the fill ratio, not counted
    pub estimated_elements: u64,
}

impl BloomFilterMetrics {
    pub fn capture<T: ?Sized>(filter: &BloomFilter<T>) -> Self {
        Self {
            bit_set_size: filter.bit_set_size(),
            num_hash_functions: filter.num_hash_functions(),
            memory_usage_bytes: filter.estimated_memory_usage(),
            current_fpp: filter.estimate_false_positive_rate(),
            fill_ratio: filter.fill_ratio(),
            estimated_elements: elements(filter.estimate_current_elements()),
        }
    }
}

impl fmt::Display for BloomFilterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bloom Filter Metrics:")?;
        writeln!(f, "- Memory Usage: {}", bytes2hr(self.memory_usage_bytes))?;
        writeln!(f, "- Current FPP: {:.4}%", self.current_fpp * 100.0)?;
        writeln!(f, "- Fill Ratio: {}", ratio2hr(self.fill_ratio))?;
        write!(f, "- Estimated Elements: {}", self.estimated_elements)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountingBloomFilterMetrics {
    pub bit_set_size: usize,
    pub memory_usage_bytes: u64,
    pub current_fpp: f64,
    pub fill_ratio: f64,
    /// Sum of all counters divided by `k`
    pub inserted_elements: u64,
    pub max_counter_value: u32,
}

impl CountingBloomFilterMetrics {
    pub fn capture<T: ?Sized>(filter: &CountingBloomFilter<T>) -> Self {
        Self {
            bit_set_size: filter.bit_set_size(),
            memory_usage_bytes: filter.estimated_memory_usage(),
            current_fpp: filter.estimate_false_positive_rate(),
            fill_ratio: filter.fill_ratio(),
            inserted_elements: per_element(
                filter.counter_sum(),
                filter.num_hash_functions(),
            ),
            max_counter_value: filter.max_counter_value(),
        }
    }
}

impl fmt::Display for CountingBloomFilterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Counting Bloom Filter Metrics:")?;
        writeln!(f, "- Memory Usage: {}", bytes2hr(self.memory_usage_bytes))?;
        writeln!(f, "- Current FPP: {:.4}%", self.current_fpp * 100.0)?;
        writeln!(f, "- Fill Ratio: {}", ratio2hr(self.fill_ratio))?;
        writeln!(f, "- Inserted Elements: {}", self.inserted_elements)?;
        write!(f, "- Max Counter Value: {}", self.max_counter_value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TtlCountingBloomFilterMetrics {
    pub bit_set_size: usize,
    pub memory_usage_bytes: u64,
    pub current_fpp: f64,
    /// Non-zero counters, stale ones included
    pub total_fill_ratio: f64,
    /// Non-zero counters still within the TTL window
    pub active_fill_ratio: f64,
    pub inserted_elements: u64,
    pub active_elements: u64,
    pub expired_elements: u64,
    pub max_counter_value: u32,
    pub ttl_slices: u32,
    pub slice_unit_millis: u64,
}

impl TtlCountingBloomFilterMetrics {
    /// Snapshot as seen at `now_millis`.
    pub fn capture_at<T: ?Sized>(
        filter: &TtlCountingBloomFilter<T>,
        now_millis: u64,
    ) -> Self {
        let k = filter.num_hash_functions();
        let non_zero = filter.counters().iter().filter(|&&c| c > 0).count();
        let inserted = per_element(filter.counter_sum(), k);
        let active =
            per_element(filter.active_counter_sum_at(now_millis), k);

        Self {
            bit_set_size: filter.bit_set_size(),
            memory_usage_bytes: filter.estimated_memory_usage(),
            current_fpp: filter.estimate_false_positive_rate_at(now_millis),
            total_fill_ratio: crate::sizing::calculate_fill_ratio(
                non_zero,
                filter.bit_set_size(),
            ),
            active_fill_ratio: filter.active_fill_ratio_at(now_millis),
            inserted_elements: inserted,
            active_elements: active,
            expired_elements: inserted.saturating_sub(active),
            max_counter_value: filter.max_counter_value(),
            ttl_slices: filter.ttl_slices(),
            slice_unit_millis: filter.slice_unit_millis(),
        }
    }

    pub fn capture<T: ?Sized>(
        filter: &TtlCountingBloomFilter<T>,
    ) -> Result<Self> {
        Ok(Self::capture_at(filter, current_millis()?))
    }
}

impl fmt::Display for TtlCountingBloomFilterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TTL Counting Bloom Filter Metrics:")?;
        writeln!(f, "- Memory Usage: {}", bytes2hr(self.memory_usage_bytes))?;
        writeln!(f, "- Current FPP: {:.4}%", self.current_fpp * 100.0)?;
        writeln!(f, "- Total Fill Ratio: {}", ratio2hr(self.total_fill_ratio))?;
        writeln!(
            f,
            "- Active Fill Ratio: {}",
            ratio2hr(self.active_fill_ratio)
        )?;
        writeln!(f, "- Total Inserted Elements: {}", self.inserted_elements)?;
        writeln!(f, "- Active Elements: {}", self.active_elements)?;
        writeln!(f, "- Expired Elements: {}", self.expired_elements)?;
        writeln!(f, "- Max Counter Value: {}", self.max_counter_value)?;
        writeln!(f, "- TTL Slices: {}", self.ttl_slices)?;
        write!(f, "- Slice Unit: {}ms", self.slice_unit_millis)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScalableBloomFilterMetrics {
    pub filter_count: usize,
    pub memory_usage_bytes: u64,
    pub current_fpp: f64,
    /// Fill ratio of all members weighted by their size
    pub average_fill_ratio: f64,
    pub estimated_elements: u64,
    pub growth_strategy: String,
}

impl ScalableBloomFilterMetrics {
    pub fn capture<T: ?Sized>(filter: &ScalableBloomFilter<T>) -> Self {
        Self {
            filter_count: filter.filter_count(),
            memory_usage_bytes: filter.estimated_memory_usage(),
            current_fpp: filter.estimate_false_positive_rate(),
            average_fill_ratio: filter.fill_ratio(),
            estimated_elements: elements(filter.estimate_current_elements()),
            growth_strategy: filter.growth_strategy().name().to_string(),
        }
    }
}

impl fmt::Display for ScalableBloomFilterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scalable Bloom Filter Metrics:")?;
        writeln!(f, "- Memory Usage: {}", bytes2hr(self.memory_usage_bytes))?;
        writeln!(f, "- Current FPP: {:.4}%", self.current_fpp * 100.0)?;
        writeln!(
            f,
            "- Average Fill Ratio: {}",
            ratio2hr(self.average_fill_ratio)
        )?;
        writeln!(f, "- Total Inserted Elements: {}", self.estimated_elements)?;
        writeln!(f, "- Number of Filters: {}", self.filter_count)?;
        write!(f, "- Growth Strategy: {}", self.growth_strategy)
    }
}
