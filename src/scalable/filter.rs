use super::ScalableBloomFilterConfig;
use super::strategy::{GrowthStrategy, GrowthStrategyRegistry};
use crate::bloom::{BloomFilter, FilterParams};
use crate::codec::{
    self, ScalableBloomFilterData, SerializationFormat, wire_int,
};
use crate::error::{BloomError, Result};
use crate::hash::HashFunction;
use crate::logger::Logger;
use crate::to_bytes::ToBytes;
use crate::traits::BloomFilterStats;
use std::fmt;
use std::iter;
use std::mem;
use std::sync::Arc;

/// Share of `initial_expected_insertions` the active filter may absorb
/// before a new member filter is appended.
pub const OVER_CAPACITY_THRESHOLD: f64 = 0.75;

/// A growing sequence of Bloom filters.
///
/// Writes go to the newest ("active") member; once its estimated load
/// reaches the over-capacity threshold a new member is appended, sized by
/// the configured [`GrowthStrategy`]. Queries check every member, newest
/// first. Old members are never dropped except by [`clear`](Self::clear).
pub struct ScalableBloomFilter<T: ?Sized> {
    config: ScalableBloomFilterConfig,
    sealed: Vec<BloomFilter<T>>,
    active: BloomFilter<T>,
    to_bytes: ToBytes<T>,
}

impl<T: ?Sized> ScalableBloomFilter<T> {
    pub fn create(
        config: ScalableBloomFilterConfig,
        to_bytes: ToBytes<T>,
    ) -> Result<Self> {
        config.validate()?;
        config.logger.log(&format!(
            "Creating ScalableBloomFilter: initial_expected_insertions={}, \
             fpp={}, seed={}, growth_strategy={}",
            config.initial_expected_insertions,
            config.false_positive_probability,
            config.seed,
            config.growth_strategy.name()
        ));
        let active = Self::initial_filter(&config, &to_bytes);
        Ok(Self {
            config,
            sealed: Vec::new(),
            active,
            to_bytes,
        })
    }

    fn initial_filter(
        config: &ScalableBloomFilterConfig,
        to_bytes: &ToBytes<T>,
    ) -> BloomFilter<T> {
        let params = FilterParams::optimal(
            config.initial_expected_insertions,
            config.false_positive_probability,
            config.seed,
        );
        config.logger.log(&format!(
            "Adding new BloomFilter: bit_set_size={}, \
             num_hash_functions={}, fpp={}",
            params.bit_set_size,
            params.num_hash_functions,
            params.false_positive_probability
        ));
        BloomFilter::empty(
            params,
            Arc::clone(&config.hash_function),
            Arc::clone(to_bytes),
            Arc::clone(&config.logger),
        )
    }

    /// Adds `value` to the active filter, then grows if that filter is over
    /// capacity.
    ///
    /// The next member is built before anything is written, so a growth
    /// strategy that yields invalid parameters fails the call and leaves
    /// the filter unchanged.
    pub fn put(&mut self, value: &T) -> Result<()> {
        let next = if self.is_over_capacity_after(value) {
            Some(self.next_filter()?)
        } else {
            None
        };
        self.active.put(value);
        if let Some(filter) = next {
            let previous = mem::replace(&mut self.active, filter);
            self.sealed.push(previous);
        }
        Ok(())
    }

    pub fn put_all<'a, I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        for value in values {
            self.put(value)?;
        }
        Ok(())
    }

    /// Checks members newest to oldest and stops at the first hit.
    pub fn might_contain(&self, value: &T) -> bool {
        self.active.might_contain(value)
            || self.sealed.iter().rev().any(|f| f.might_contain(value))
    }

    pub fn might_contain_all<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let all = values.into_iter().all(|value| self.might_contain(value));
        if !all {
            self.config
                .logger
                .log("ScalableBloomFilter: Might not contain all values");
        }
        all
    }

    /// Drops every member and starts over with one filter sized from the
    /// initial load.
    pub fn clear(&mut self) {
        self.config
            .logger
            .log("ScalableBloomFilter: Clearing all BloomFilters");
        self.sealed.clear();
        self.active = Self::initial_filter(&self.config, &self.to_bytes);
    }

    fn is_over_capacity_after(&self, value: &T) -> bool {
        let limit = self.config.initial_expected_insertions as f64
            * OVER_CAPACITY_THRESHOLD;
        self.active.estimate_after_put(value) >= limit
    }

    fn next_filter(&self) -> Result<BloomFilter<T>> {
        let strategy = &self.config.growth_strategy;
        let next = strategy.next_params(self.active.params());
        next.validate().map_err(|e| {
            BloomError::InvalidConfig(format!(
                "Growth strategy '{}' produced invalid parameters: {e}",
                strategy.name()
            ))
        })?;
        self.config.logger.log(&format!(
            "Adding new BloomFilter: bit_set_size={}, \
             num_hash_functions={}, fpp={}",
            next.bit_set_size,
            next.num_hash_functions,
            next.false_positive_probability
        ));
        Ok(BloomFilter::empty(
            next,
            Arc::clone(&self.config.hash_function),
            Arc::clone(&self.to_bytes),
            Arc::clone(&self.config.logger),
        ))
    }

    /// Members from oldest to newest.
    pub fn filters(&self) -> impl Iterator<Item = &BloomFilter<T>> {
        self.sealed.iter().chain(iter::once(&self.active))
    }

    pub fn filter_count(&self) -> usize {
        self.sealed.len() + 1
    }

    /// The member currently receiving writes.
    pub fn active_filter(&self) -> &BloomFilter<T> {
        &self.active
    }

    pub fn config(&self) -> &ScalableBloomFilterConfig {
        &self.config
    }

    pub fn initial_expected_insertions(&self) -> usize {
        self.config.initial_expected_insertions
    }

    pub fn false_positive_probability(&self) -> f64 {
        self.config.false_positive_probability
    }

    pub fn seed(&self) -> i32 {
        self.config.seed
    }

    pub fn growth_strategy(&self) -> &Arc<dyn GrowthStrategy> {
        &self.config.growth_strategy
    }

    pub fn hash_function(&self) -> &Arc<dyn HashFunction> {
        &self.config.hash_function
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.config.logger
    }

    pub fn to_data(&self) -> Result<ScalableBloomFilterData> {
        Ok(ScalableBloomFilterData {
            initial_expected_insertions: wire_int(
                self.config.initial_expected_insertions,
                "initial_expected_insertions",
            )?,
            false_positive_probability: self.config.false_positive_probability,
            seed: self.config.seed,
            growth_strategy: self.config.growth_strategy.name().to_string(),
            filters: self
                .filters()
                .map(BloomFilter::to_data)
                .collect::<Result<_>>()?,
        })
    }

    /// Rebuilds a scalable filter, resolving its growth strategy by name
    /// through `registry`.
    pub fn from_data(
        data: ScalableBloomFilterData,
        registry: &GrowthStrategyRegistry,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        data.check()?;
        let growth_strategy = registry.resolve(&data.growth_strategy)?;
        let config = ScalableBloomFilterConfig {
            initial_expected_insertions: data.initial_expected_insertions
                as usize,
            false_positive_probability: data.false_positive_probability,
            seed: data.seed,
            growth_strategy,
            hash_function,
            logger,
        };

        let mut sealed = data
            .filters
            .into_iter()
            .map(|record| {
                BloomFilter::from_data(
                    record,
                    Arc::clone(&config.hash_function),
                    Arc::clone(&to_bytes),
                    Arc::clone(&config.logger),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        let active = sealed.pop().ok_or_else(|| {
            BloomError::Deserialization(
                "Expected at least 1 member filter".into(),
            )
        })?;

        config.logger.log(&format!(
            "ScalableBloomFilter restored with {} filters",
            sealed.len() + 1
        ));
        Ok(Self {
            config,
            sealed,
            active,
            to_bytes,
        })
    }

    pub fn serialize(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        self.config.logger.log(&format!(
            "Serializing ScalableBloomFilter with format: {format}"
        ));
        codec::encode(&self.to_data()?, format)
    }

    pub fn deserialize(
        data: &[u8],
        format: SerializationFormat,
        registry: &GrowthStrategyRegistry,
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        logger.log(&format!(
            "Deserializing ScalableBloomFilter with format: {format}"
        ));
        let record: ScalableBloomFilterData = codec::decode(data, format)?;
        Self::from_data(record, registry, hash_function, to_bytes, logger)
    }
}

impl<T: ?Sized> BloomFilterStats for ScalableBloomFilter<T> {
    /// Total bits across all members.
    fn bit_set_size(&self) -> usize {
        self.filters().map(|f| f.bit_set_size()).sum()
    }

    fn set_bits_count(&self) -> usize {
        self.filters().map(|f| f.set_bits_count()).sum()
    }

    fn estimate_current_elements(&self) -> f64 {
        self.filters().map(|f| f.estimate_current_elements()).sum()
    }

    /// `1 - Π(1 - p_i)` over the members' estimated rates.
    fn estimate_false_positive_rate(&self) -> f64 {
        let all_negative: f64 = self
            .filters()
            .map(|f| 1.0 - f.estimate_false_positive_rate())
            .product();
        1.0 - all_negative
    }

    fn estimated_memory_usage(&self) -> u64 {
        self.filters().map(|f| f.estimated_memory_usage()).sum()
    }
}

impl<T: ?Sized> Clone for ScalableBloomFilter<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            sealed: self.sealed.clone(),
            active: self.active.clone(),
            to_bytes: Arc::clone(&self.to_bytes),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ScalableBloomFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalableBloomFilter")
            .field("config", &self.config)
            .field("filter_count", &self.filter_count())
            .field("active", &self.active)
            .finish()
    }
}
