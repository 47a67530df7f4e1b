use super::{BloomFilterConfig, FilterParams};
use crate::bitarray::WordBitArray;
use crate::codec::{self, BloomFilterData, SerializationFormat, wire_int};
use crate::error::Result;
use crate::hash::{HashFunction, IndexHasher};
use crate::logger::Logger;
use crate::sizing;
use crate::to_bytes::ToBytes;
use crate::traits::BloomFilterStats;
use std::fmt;
use std::sync::Arc;

/// Classic Bloom filter over a packed bit array.
///
/// Supports insertion and membership queries only; there is no removal.
/// `T` may be unsized (`BloomFilter<str>`), elements are passed by reference
/// and turned into bytes by the injected [`ToBytes`] projection.
pub struct BloomFilter<T: ?Sized> {
    params: FilterParams,
    bits: WordBitArray,
    hasher: IndexHasher<T>,
    logger: Arc<dyn Logger>,
}

impl<T: ?Sized> BloomFilter<T> {
    /// Builds an empty filter sized for the configured load.
    pub fn create(
        config: BloomFilterConfig,
        to_bytes: ToBytes<T>,
    ) -> Result<Self> {
        config.validate()?;
        let params = FilterParams::from(&config);
        config.logger.log(&format!(
            "Creating BloomFilter with m = {}, k = {}, seed = {}",
            params.bit_set_size, params.num_hash_functions, params.seed
        ));
        Ok(Self::empty(params, config.hash_function, to_bytes, config.logger))
    }

    /// Builds an empty filter with exactly the given `m`, `k` and `fpp`.
    pub fn create_with_fixed_size(
        params: FilterParams,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        params.validate()?;
        logger.log(&format!(
            "Creating BloomFilter with fixed size: m = {}, k = {}, seed = {}",
            params.bit_set_size, params.num_hash_functions, params.seed
        ));
        Ok(Self::empty(params, hash_function, to_bytes, logger))
    }

    /// Rebuilds a filter from persisted state.
    ///
    /// Only structural consistency is checked (`m > 0`, `k > 0`, word count
    /// matches `m`); the stored `fpp` is taken as is.
    pub fn restore(
        params: FilterParams,
        words: Vec<u64>,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        params.validate_shape()?;
        let bits = WordBitArray::from_words(params.bit_set_size, words)?;
        logger.log(&format!(
            "Restoring BloomFilter with m = {}, k = {}, seed = {}",
            params.bit_set_size, params.num_hash_functions, params.seed
        ));
        Ok(Self::build(params, bits, hash_function, to_bytes, logger))
    }

    /// Empty filter from parameters the caller has already validated.
    pub(crate) fn empty(
        params: FilterParams,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let bits = WordBitArray::new(params.bit_set_size);
        Self::build(params, bits, hash_function, to_bytes, logger)
    }

    fn build(
        params: FilterParams,
        bits: WordBitArray,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let hasher = IndexHasher::new(
            hash_function,
            to_bytes,
            params.seed,
            params.num_hash_functions,
            params.bit_set_size,
        );
        Self {
            params,
            bits,
            hasher,
            logger,
        }
    }

    pub fn put(&mut self, value: &T) {
        for index in self.hasher.indices(value) {
            self.bits.set(index);
        }
    }

    /// Estimated element count once `value` is written. Leaves the bits
    /// untouched.
    pub(crate) fn estimate_after_put(&self, value: &T) -> f64 {
        let mut fresh: Vec<usize> = self
            .hasher
            .indices(value)
            .filter(|&index| !self.bits.get(index))
            .collect();
        fresh.sort_unstable();
        fresh.dedup();
        sizing::estimate_current_elements(
            self.set_bits_count() + fresh.len(),
            self.params.bit_set_size,
            self.params.num_hash_functions,
        )
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

    /// `false` means definitely absent; `true` means possibly present.
    pub fn might_contain(&self, value: &T) -> bool {
        self.hasher.indices(value).all(|index| self.bits.get(index))
    }

    /// `true` only if every value might be present. Stops at the first miss.
    pub fn might_contain_all<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let all = values.into_iter().all(|value| self.might_contain(value));
        if !all {
            self.logger
                .log("One of the values is definitely not in the BloomFilter");
        }
        all
    }

    pub fn clear(&mut self) {
        self.bits.clear();
        self.logger.log("BloomFilter cleared");
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    pub fn num_hash_functions(&self) -> usize {
        self.params.num_hash_functions
    }

    pub fn seed(&self) -> i32 {
        self.params.seed
    }

    pub fn false_positive_probability(&self) -> f64 {
        self.params.false_positive_probability
    }

    /// The packed words backing the filter, bit `i` in word `i >> 6`.
    pub fn bit_array(&self) -> &[u64] {
        self.bits.words()
    }

    pub fn hash_function(&self) -> &Arc<dyn HashFunction> {
        self.hasher.hash_function()
    }

    pub fn to_bytes(&self) -> &ToBytes<T> {
        self.hasher.to_bytes()
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    pub fn to_data(&self) -> Result<BloomFilterData> {
        Ok(BloomFilterData {
            bit_set_size: wire_int(self.params.bit_set_size, "bit_set_size")?,
            num_hash_functions: wire_int(
                self.params.num_hash_functions,
                "num_hash_functions",
            )?,
            seed: self.params.seed,
            false_positive_probability: self.params.false_positive_probability,
            bit_array: self.bits.words().to_vec(),
        })
    }

    pub fn from_data(
        data: BloomFilterData,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        data.check()?;
        let params = FilterParams::new(
            data.bit_set_size as usize,
            data.num_hash_functions as usize,
            data.seed,
            data.false_positive_probability,
        );
        Self::restore(params, data.bit_array, hash_function, to_bytes, logger)
    }

    pub fn serialize(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        self.logger
            .log(&format!("Serializing BloomFilter with format: {format}"));
        codec::encode(&self.to_data()?, format)
    }

    pub fn deserialize(
        data: &[u8],
        format: SerializationFormat,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        logger.log(&format!("Deserializing BloomFilter with format: {format}"));
        let record: BloomFilterData = codec::decode(data, format)?;
        Self::from_data(record, hash_function, to_bytes, logger)
    }
}

impl<T: ?Sized> BloomFilterStats for BloomFilter<T> {
    fn bit_set_size(&self) -> usize {
        self.params.bit_set_size
    }

    fn set_bits_count(&self) -> usize {
        self.bits.count_set_bits()
    }

    fn estimate_current_elements(&self) -> f64 {
        sizing::estimate_current_elements(
            self.set_bits_count(),
            self.params.bit_set_size,
            self.params.num_hash_functions,
        )
    }

    fn estimate_false_positive_rate(&self) -> f64 {
        sizing::estimate_false_positive_rate(
            self.params.num_hash_functions,
            self.estimate_current_elements(),
            self.params.bit_set_size,
        )
    }

    fn estimated_memory_usage(&self) -> u64 {
        sizing::estimate_memory_usage(self.params.bit_set_size)
    }
}

impl<T: ?Sized> Clone for BloomFilter<T> {
    fn clone(&self) -> Self {
        Self {
            params: self.params,
            bits: self.bits.clone(),
            hasher: self.hasher.clone(),
            logger: Arc::clone(&self.logger),
        }
    }
}

impl<T: ?Sized> fmt::Debug for BloomFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("params", &self.params)
            .field("set_bits", &self.bits.count_set_bits())
            .field("hash_function", self.hasher.hash_function())
            .finish()
    }
}
