use super::CountingBloomFilterConfig;
use crate::codec::{
    self, CountingBloomFilterData, SerializationFormat, wire_int,
};
use crate::error::{BloomError, Result};
use crate::hash::{HashFunction, IndexHasher};
use crate::logger::Logger;
use crate::sizing;
use crate::to_bytes::ToBytes;
use crate::traits::BloomFilterStats;
use std::fmt;
use std::sync::Arc;

/// Bloom filter with saturating counters in place of bits, so elements can
/// be removed again.
pub struct CountingBloomFilter<T: ?Sized> {
    config: CountingBloomFilterConfig,
    counters: Vec<u32>,
    hasher: IndexHasher<T>,
}

impl<T: ?Sized> CountingBloomFilter<T> {
    pub fn create(
        config: CountingBloomFilterConfig,
        to_bytes: ToBytes<T>,
    ) -> Result<Self> {
        config.validate()?;
        let counters = vec![0; config.bit_set_size];
        Ok(Self::build(config, counters, to_bytes))
    }

    /// Rebuilds a filter from persisted counters. The counter count must
    /// equal the configured `bit_set_size`.
    pub fn restore(
        config: CountingBloomFilterConfig,
        counters: Vec<u32>,
        to_bytes: ToBytes<T>,
    ) -> Result<Self> {
        config.validate()?;
        if counters.len() != config.bit_set_size {
            return Err(BloomError::InvalidConfig(format!(
                "Counters size {} must match bit_set_size {}",
                counters.len(),
                config.bit_set_size
            )));
        }
        Ok(Self::build(config, counters, to_bytes))
    }

    fn build(
        config: CountingBloomFilterConfig,
        counters: Vec<u32>,
        to_bytes: ToBytes<T>,
    ) -> Self {
        config.logger.log(&format!(
            "CountingBloomFilter created with bit_set_size={}, \
             num_hash_functions={}, max_counter_value={}, seed={}",
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
            hasher,
        }
    }

    /// Increments every indexed counter, stopping at `max_counter_value`.
    pub fn put(&mut self, value: &T) {
        let max = self.config.max_counter_value;
        for index in self.hasher.indices(value) {
            let counter = &mut self.counters[index];
            if *counter < max {
                *counter += 1;
            }
        }
    }

    /// Decrements every indexed counter, stopping at zero. Removing an
    /// element that was never added is a no-op on already-zero counters.
    pub fn remove(&mut self, value: &T) {
        for index in self.hasher.indices(value) {
            let counter = &mut self.counters[index];
            *counter = counter.saturating_sub(1);
        }
    }

    pub fn might_contain(&self, value: &T) -> bool {
        self.hasher
            .indices(value)
            .all(|index| self.counters[index] > 0)
    }

    /// Point estimate of how many times `value` was added: the smallest
    /// of its counters.
    pub fn count(&self, value: &T) -> u32 {
        self.hasher
            .indices(value)
            .map(|index| self.counters[index])
            .min()
            .unwrap_or(0)
    }

    pub fn put_all<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        for value in values {
            self.put(value);
        }
    }

    pub fn might_contain_all<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let all = values.into_iter().all(|value| self.might_contain(value));
        if !all {
            self.config.logger.log(
                "One of the values is definitely not in the \
                 CountingBloomFilter",
            );
        }
        all
    }

    pub fn clear(&mut self) {
        self.counters.fill(0);
        self.config.logger.log("CountingBloomFilter cleared");
    }

    pub fn config(&self) -> &CountingBloomFilterConfig {
        &self.config
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

    pub fn counters(&self) -> &[u32] {
        &self.counters
    }

    /// Sum of every counter, saturated increments included.
    pub fn counter_sum(&self) -> u64 {
        self.counters.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn hash_function(&self) -> &Arc<dyn HashFunction> {
        &self.config.hash_function
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.config.logger
    }

    pub fn to_data(&self) -> Result<CountingBloomFilterData> {
        Ok(CountingBloomFilterData {
            bit_set_size: wire_int(self.config.bit_set_size, "bit_set_size")?,
            num_hash_functions: wire_int(
                self.config.num_hash_functions,
                "num_hash_functions",
            )?,
            // validate() caps the maximum, so every counter fits
            max_counter_value: self.config.max_counter_value as i32,
            seed: self.config.seed,
            counters: self.counters.iter().map(|&c| c as i32).collect(),
        })
    }

    pub fn from_data(
        data: CountingBloomFilterData,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        data.check()?;
        let config = CountingBloomFilterConfig {
            bit_set_size: data.bit_set_size as usize,
            num_hash_functions: data.num_hash_functions as usize,
            max_counter_value: data.max_counter_value as u32,
            seed: data.seed,
            hash_function,
            logger,
        };
        let counters = data.counters.into_iter().map(|c| c as u32).collect();
        Self::restore(config, counters, to_bytes)
    }

    pub fn serialize(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        self.config.logger.log(&format!(
            "Serializing CountingBloomFilter with format: {format}"
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
            "Deserializing CountingBloomFilter with format: {format}"
        ));
        let record: CountingBloomFilterData = codec::decode(data, format)?;
        Self::from_data(record, hash_function, to_bytes, logger)
    }
}

impl<T: ?Sized> BloomFilterStats for CountingBloomFilter<T> {
    fn bit_set_size(&self) -> usize {
        self.config.bit_set_size
    }

    fn set_bits_count(&self) -> usize {
        self.counters.iter().filter(|&&c| c > 0).count()
    }

    fn estimate_current_elements(&self) -> f64 {
        sizing::estimate_current_elements(
            self.set_bits_count(),
            self.config.bit_set_size,
            self.config.num_hash_functions,
        )
    }

    fn estimate_false_positive_rate(&self) -> f64 {
        sizing::estimate_false_positive_rate(
            self.config.num_hash_functions,
            self.estimate_current_elements(),
            self.config.bit_set_size,
        )
    }

    /// Four bytes per counter.
    fn estimated_memory_usage(&self) -> u64 {
        self.config.bit_set_size as u64 * 4
    }
}

impl<T: ?Sized> Clone for CountingBloomFilter<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            counters: self.counters.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for CountingBloomFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingBloomFilter")
            .field("config", &self.config)
            .field("non_zero_counters", &self.set_bits_count())
            .finish()
    }
}
