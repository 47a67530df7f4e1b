//! Counting Bloom filter whose counters expire.
//!
//! Wall-clock time is bucketed into slices of `slice_unit` milliseconds and
//! every counter remembers the slice in which it was last written. A counter
//! whose slice lags the current one by more than `ttl_slices` is stale: it
//! reads as absent, and the next write to it starts again from zero.
//!
//! Slice indices are 32-bit and wrap, so differences are computed with
//! wrapping arithmetic.
use super::TtlCountingBloomFilterConfig;
use crate::codec::{
    self, SerializationFormat, TtlCountingBloomFilterData, wire_int,
};
use crate::error::{BloomError, Result};
use crate::hash::{HashFunction, IndexHasher};
use crate::logger::Logger;
use crate::sizing;
use crate::to_bytes::ToBytes;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the UNIX epoch.
pub fn current_millis() -> Result<u64> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(elapsed.as_millis() as u64)
}

pub struct TtlCountingBloomFilter<T: ?Sized> {
    config: TtlCountingBloomFilterConfig,
    counters: Vec<u32>,
    last_update_slices: Vec<i32>,
    ttl_slices: u32,
    slice_unit_millis: u64,
    hasher: IndexHasher<T>,
}

impl<T: ?Sized> TtlCountingBloomFilter<T> {
    pub fn create(
        config: TtlCountingBloomFilterConfig,
        to_bytes: ToBytes<T>,
    ) -> Result<Self> {
        config.validate()?;
        let m = config.bit_set_size;
        Ok(Self::build(config, vec![0; m], vec![0; m], to_bytes))
    }

    /// Rebuilds a filter from persisted counters and slices; both must have
    /// exactly `bit_set_size` entries.
    pub fn restore(
        config: TtlCountingBloomFilterConfig,
        counters: Vec<u32>,
        last_update_slices: Vec<i32>,
        to_bytes: ToBytes<T>,
    ) -> Result<Self> {
        config.validate()?;
        let m = config.bit_set_size;
        if counters.len() != m || last_update_slices.len() != m {
            return Err(BloomError::InvalidConfig(format!(
                "Counters ({}) and slices ({}) must both match \
                 bit_set_size {m}",
                counters.len(),
                last_update_slices.len()
            )));
        }
        Ok(Self::build(config, counters, last_update_slices, to_bytes))
    }

    fn build(
        config: TtlCountingBloomFilterConfig,
        counters: Vec<u32>,
        last_update_slices: Vec<i32>,
        to_bytes: ToBytes<T>,
    ) -> Self {
        let ttl_slices = config.ttl_slices();
        let slice_unit_millis = config.slice_unit_millis();
        config.logger.log(&format!(
            "TtlCountingBloomFilter created with bit_set_size={}, \
             num_hash_functions={}, max_counter_value={}, seed={}, \
             ttl_slices={ttl_slices}, slice_unit_millis={slice_unit_millis}",
            config.bit_set_size,
            config.num_hash_functions,
            config.max_counter_value,
            config.seed
        ));
        let hasher = IndexHasher::new(
            Arc::clone(&config.hash_function),
            to_bytes,
            config.seed,
            config.num_hash_functions,
            config.bit_set_size,
        );
        Self {
            config,
            counters,
            last_update_slices,
            ttl_slices,
            slice_unit_millis,
            hasher,
        }
    }

    /// Slice index of a timestamp, truncated to 32 bits.
    pub fn slice_at(&self, now_millis: u64) -> i32 {
        (now_millis / self.slice_unit_millis) as i32
    }

    fn is_stale(&self, index: usize, current_slice: i32) -> bool {
        let age = current_slice.wrapping_sub(self.last_update_slices[index]);
        age > self.ttl_slices as i32
    }

    pub fn put_at(&mut self, value: &T, now_millis: u64) {
        let current = self.slice_at(now_millis);
        let max = self.config.max_counter_value;
        for index in self.hasher.indices(value) {
            let age = current.wrapping_sub(self.last_update_slices[index]);
            let counter = &mut self.counters[index];
            if age > self.ttl_slices as i32 {
                *counter = 0;
            }
            if *counter < max {
                *counter += 1;
            }
            self.last_update_slices[index] = current;
        }
    }

    pub fn remove_at(&mut self, value: &T, now_millis: u64) {
        let current = self.slice_at(now_millis);
        for index in self.hasher.indices(value) {
            let age = current.wrapping_sub(self.last_update_slices[index]);
            let counter = &mut self.counters[index];
            if age > self.ttl_slices as i32 {
                *counter = 0;
            }
            *counter = counter.saturating_sub(1);
            self.last_update_slices[index] = current;
        }
    }

    /// Pure read: stale counters answer `false` but are left in place.
    pub fn might_contain_at(&self, value: &T, now_millis: u64) -> bool {
        let current = self.slice_at(now_millis);
        self.hasher.indices(value).all(|index| {
            !self.is_stale(index, current) && self.counters[index] > 0
        })
    }

    /// Minimum counter over the indices, or 0 as soon as one is stale.
    pub fn count_at(&self, value: &T, now_millis: u64) -> u32 {
        let current = self.slice_at(now_millis);
        let mut min = None;
        for index in self.hasher.indices(value) {
            if self.is_stale(index, current) {
                return 0;
            }
            let counter = self.counters[index];
            min = Some(min.map_or(counter, |m: u32| m.min(counter)));
        }
        min.unwrap_or(0)
    }

    pub fn put_all_at<'a, I>(&mut self, values: I, now_millis: u64)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        for value in values {
            self.put_at(value, now_millis);
        }
    }

    pub fn might_contain_all_at<'a, I>(
        &self,
        values: I,
        now_millis: u64,
    ) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let all = values
            .into_iter()
            .all(|value| self.might_contain_at(value, now_millis));
        if !all {
            self.config.logger.log(
                "One of the values is definitely not in the \
                 TtlCountingBloomFilter",
            );
        }
        all
    }

    /// Zeroes every stale counter. Slices are kept, so a swept slot still
    /// reports its last write time.
    pub fn cleanup_expired_at(&mut self, now_millis: u64) -> usize {
        let current = self.slice_at(now_millis);
        let mut swept = 0;
        for index in 0..self.counters.len() {
            if self.counters[index] > 0 && self.is_stale(index, current) {
                self.counters[index] = 0;
                swept += 1;
            }
        }
        self.config.logger.log(&format!(
            "TtlCountingBloomFilter: cleanup_expired swept {swept} counters"
        ));
        swept
    }

    pub fn put(&mut self, value: &T) -> Result<()> {
        self.put_at(value, current_millis()?);
        Ok(())
    }

    pub fn remove(&mut self, value: &T) -> Result<()> {
        self.remove_at(value, current_millis()?);
        Ok(())
    }

    pub fn might_contain(&self, value: &T) -> Result<bool> {
        Ok(self.might_contain_at(value, current_millis()?))
    }

    pub fn count(&self, value: &T) -> Result<u32> {
        Ok(self.count_at(value, current_millis()?))
    }

    pub fn put_all<'a, I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.put_all_at(values, current_millis()?);
        Ok(())
    }

    pub fn might_contain_all<'a, I>(&self, values: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        Ok(self.might_contain_all_at(values, current_millis()?))
    }

    pub fn cleanup_expired(&mut self) -> Result<usize> {
        Ok(self.cleanup_expired_at(current_millis()?))
    }

    /// Zeroes both counters and slices.
    pub fn clear(&mut self) {
        self.counters.fill(0);
        self.last_update_slices.fill(0);
        self.config.logger.log("TtlCountingBloomFilter: cleared");
    }

    /// Counters that are non-zero and still within the TTL window.
    pub fn active_slots_at(&self, now_millis: u64) -> usize {
        let current = self.slice_at(now_millis);
        (0..self.counters.len())
            .filter(|&i| self.counters[i] > 0 && !self.is_stale(i, current))
            .count()
    }

    /// Sum of counters still within the TTL window.
    pub fn active_counter_sum_at(&self, now_millis: u64) -> u64 {
        let current = self.slice_at(now_millis);
        (0..self.counters.len())
            .filter(|&i| !self.is_stale(i, current))
            .map(|i| u64::from(self.counters[i]))
            .sum()
    }

    /// Sum of every counter, stale ones included.
    pub fn counter_sum(&self) -> u64 {
        self.counters.iter().map(|&c| u64::from(c)).sum()
    }

    /// Load estimate counting only fresh, non-zero counters.
    pub fn estimate_current_elements_at(&self, now_millis: u64) -> f64 {
        sizing::estimate_current_elements(
            self.active_slots_at(now_millis),
            self.config.bit_set_size,
            self.config.num_hash_functions,
        )
    }

    pub fn estimate_false_positive_rate_at(&self, now_millis: u64) -> f64 {
        sizing::estimate_false_positive_rate(
            self.config.num_hash_functions,
            self.estimate_current_elements_at(now_millis),
            self.config.bit_set_size,
        )
    }

    pub fn active_fill_ratio_at(&self, now_millis: u64) -> f64 {
        sizing::calculate_fill_ratio(
            self.active_slots_at(now_millis),
            self.config.bit_set_size,
        )
    }

    /// Counters plus slices, four bytes each.
    pub fn estimated_memory_usage(&self) -> u64 {
        self.config.bit_set_size as u64 * 8
    }

    pub fn config(&self) -> &TtlCountingBloomFilterConfig {
        &self.config
    }

    pub fn bit_set_size(&self) -> usize {
        self.config.bit_set_size
    }

    pub fn num_hash_functions(&self) -> usize {
        self.config.num_hash_functions
    }

    pub fn max_counter_value(&self) -> u32 {
        self.config.max_counter_value
    }

    pub fn seed(&self) -> i32 {
        self.config.seed
    }

    pub fn ttl_slices(&self) -> u32 {
        self.ttl_slices
    }

    pub fn slice_unit_millis(&self) -> u64 {
        self.slice_unit_millis
    }

    pub fn counters(&self) -> &[u32] {
        &self.counters
    }

    pub fn last_update_slices(&self) -> &[i32] {
        &self.last_update_slices
    }

    pub fn hash_function(&self) -> &Arc<dyn HashFunction> {
        &self.config.hash_function
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.config.logger
    }

    pub fn to_data(&self) -> Result<TtlCountingBloomFilterData> {
        Ok(TtlCountingBloomFilterData {
            bit_set_size: wire_int(self.config.bit_set_size, "bit_set_size")?,
            num_hash_functions: wire_int(
                self.config.num_hash_functions,
                "num_hash_functions",
            )?,
            max_counter_value: self.config.max_counter_value as i32,
            seed: self.config.seed,
            ttl_slices: self.ttl_slices as i32,
            slice_unit_millis: self.slice_unit_millis as i64,
            counters: self.counters.iter().map(|&c| c as i32).collect(),
            last_update_slices: self.last_update_slices.clone(),
        })
    }

    pub fn from_data(
        data: TtlCountingBloomFilterData,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        data.check()?;
        let slice_unit_millis = data.slice_unit_millis as u64;
        // ttl_slices whole slices survive the ttl / slice_unit division intact
        let ttl_millis = slice_unit_millis
            .checked_mul(data.ttl_slices as u64)
            .ok_or_else(|| {
                BloomError::Deserialization(format!(
                    "ttl of {} slices of {slice_unit_millis}ms overflows",
                    data.ttl_slices
                ))
            })?;
        let config = TtlCountingBloomFilterConfig {
            bit_set_size: data.bit_set_size as usize,
            num_hash_functions: data.num_hash_functions as usize,
            max_counter_value: data.max_counter_value as u32,
            seed: data.seed,
            ttl: Duration::from_millis(ttl_millis),
            slice_unit: Duration::from_millis(slice_unit_millis),
            hash_function,
            logger,
        };
        let counters = data.counters.into_iter().map(|c| c as u32).collect();
        Self::restore(config, counters, data.last_update_slices, to_bytes)
    }

    pub fn serialize(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        self.config.logger.log(&format!(
            "TtlCountingBloomFilter: serializing with format: {format}"
        ));
        codec::encode(&self.to_data()?, format)
    }

    pub fn deserialize(
        data: &[u8],
        format: SerializationFormat,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        logger.log(&format!(
            "TtlCountingBloomFilter: deserializing with format: {format}"
        ));
        let record: TtlCountingBloomFilterData = codec::decode(data, format)?;
        Self::from_data(record, hash_function, to_bytes, logger)
    }
}

impl<T: ?Sized> Clone for TtlCountingBloomFilter<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            counters: self.counters.clone(),
            last_update_slices: self.last_update_slices.clone(),
            ttl_slices: self.ttl_slices,
            slice_unit_millis: self.slice_unit_millis,
            hasher: self.hasher.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for TtlCountingBloomFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCountingBloomFilter")
            .field("config", &self.config)
            .field("ttl_slices", &self.ttl_slices)
            .field("slice_unit_millis", &self.slice_unit_millis)
            .finish()
    }
}
