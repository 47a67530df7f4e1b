//! Big-endian binary layouts.
//!
//! - plain: `m:i32 k:i32 seed:i32 fpp:f64`, then `ceil(m/64)` `u64` words.
//! - counting: `m:i32 k:i32 max:i32 seed:i32`, then `m` `i32` counters.
//! - ttl: `m k max seed ttl_slices:i32 slice_unit_millis:i64`, then `m`
//!   counters and `m` `i32` slices.
//! - scalable: `n:i32 fpp:f64 seed:i32 name_len:i32 name:utf8 count:i32`,
//!   then `count` members, each `m k seed:i32 fpp:f64 len:i32` followed by
//!   `len` words.
//!
//! Every read checks the remaining length first; payload sizes derived from
//! the header must match the bytes actually present.
use super::WireRecord;
use super::records::{
    BloomFilterData, CountingBloomFilterData, ScalableBloomFilterData,
    TtlCountingBloomFilterData,
};
use crate::error::{BloomError, Result};
use bytes::{Buf, BufMut, BytesMut};

pub const PLAIN_HEADER_LEN: usize = 20;
pub const COUNTING_HEADER_LEN: usize = 16;
pub const TTL_HEADER_LEN: usize = 28;

/// Bounds-checked cursor over a binary payload.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(BloomError::Deserialization(format!(
                "Data too short for {what}: need {needed} bytes, {} left",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn i32(&mut self, what: &str) -> Result<i32> {
        self.ensure(4, what)?;
        Ok(self.buf.get_i32())
    }

    pub fn i64(&mut self, what: &str) -> Result<i64> {
        self.ensure(8, what)?;
        Ok(self.buf.get_i64())
    }

    pub fn f64(&mut self, what: &str) -> Result<f64> {
        self.ensure(8, what)?;
        Ok(self.buf.get_f64())
    }

    pub fn bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        self.ensure(len, what)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Reads `count` words after checking the whole run is present.
    pub fn u64_vec(&mut self, count: usize, what: &str) -> Result<Vec<u64>> {
        self.ensure(count.saturating_mul(8), what)?;
        Ok((0..count).map(|_| self.buf.get_u64()).collect())
    }

    pub fn i32_vec(&mut self, count: usize, what: &str) -> Result<Vec<i32>> {
        self.ensure(count.saturating_mul(4), what)?;
        Ok((0..count).map(|_| self.buf.get_i32()).collect())
    }

    /// Requires the exact number of bytes left, rejecting short and
    /// oversized payloads alike.
    pub fn expect_exact(&self, expected: usize, what: &str) -> Result<()> {
        if self.buf.remaining() != expected {
            return Err(BloomError::Deserialization(format!(
                "Data size mismatch for {what}: \
                 expected {expected} bytes, got {}",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn finish(&self) -> Result<()> {
        if self.buf.has_remaining() {
            return Err(BloomError::Deserialization(format!(
                "{} trailing bytes after record",
                self.buf.remaining()
            )));
        }
        Ok(())
    }
}

fn positive_len(value: i32, field: &str) -> Result<usize> {
    if value <= 0 {
        return Err(BloomError::Deserialization(format!(
            "{field} must be > 0, got {value}"
        )));
    }
    Ok(value as usize)
}

fn word_count(bit_set_size: usize) -> usize {
    bit_set_size.div_ceil(64)
}

impl WireRecord for BloomFilterData {
    fn write_binary(&self, buf: &mut BytesMut) {
        buf.reserve(PLAIN_HEADER_LEN + self.bit_array.len() * 8);
        buf.put_i32(self.bit_set_size);
        buf.put_i32(self.num_hash_functions);
        buf.put_i32(self.seed);
        buf.put_f64(self.false_positive_probability);
        for &word in &self.bit_array {
            buf.put_u64(word);
        }
    }

    fn read_binary(reader: &mut WireReader<'_>) -> Result<Self> {
        reader.ensure(PLAIN_HEADER_LEN, "Bloom filter header")?;
        let bit_set_size = reader.i32("bit_set_size")?;
        let num_hash_functions = reader.i32("num_hash_functions")?;
        let seed = reader.i32("seed")?;
        let false_positive_probability = reader.f64("fpp")?;

        let words = word_count(positive_len(bit_set_size, "bit_set_size")?);
        reader.expect_exact(words * 8, "bit array")?;
        let bit_array = reader.u64_vec(words, "bit array")?;

        Ok(Self {
            bit_set_size,
            num_hash_functions,
            seed,
            false_positive_probability,
            bit_array,
        })
    }

    fn validate(&self) -> Result<()> {
        self.check()
    }
}

impl WireRecord for CountingBloomFilterData {
    fn write_binary(&self, buf: &mut BytesMut) {
        buf.reserve(COUNTING_HEADER_LEN + self.counters.len() * 4);
        buf.put_i32(self.bit_set_size);
        buf.put_i32(self.num_hash_functions);
        buf.put_i32(self.max_counter_value);
        buf.put_i32(self.seed);
        for &counter in &self.counters {
            buf.put_i32(counter);
        }
    }

    fn read_binary(reader: &mut WireReader<'_>) -> Result<Self> {
        reader.ensure(COUNTING_HEADER_LEN, "counting filter header")?;
        let bit_set_size = reader.i32("bit_set_size")?;
        let num_hash_functions = reader.i32("num_hash_functions")?;
        let max_counter_value = reader.i32("max_counter_value")?;
        let seed = reader.i32("seed")?;

        let m = positive_len(bit_set_size, "bit_set_size")?;
        reader.expect_exact(m * 4, "counters")?;
        let counters = reader.i32_vec(m, "counters")?;

        Ok(Self {
            bit_set_size,
            num_hash_functions,
            max_counter_value,
            seed,
            counters,
        })
    }

    fn validate(&self) -> Result<()> {
        self.check()
    }
}

impl WireRecord for TtlCountingBloomFilterData {
    fn write_binary(&self, buf: &mut BytesMut) {
        buf.reserve(TTL_HEADER_LEN + self.counters.len() * 8);
        buf.put_i32(self.bit_set_size);
        buf.put_i32(self.num_hash_functions);
        buf.put_i32(self.max_counter_value);
        buf.put_i32(self.seed);
        buf.put_i32(self.ttl_slices);
        buf.put_i64(self.slice_unit_millis);
        for &counter in &self.counters {
            buf.put_i32(counter);
        }
        for &slice in &self.last_update_slices {
            buf.put_i32(slice);
        }
    }

    fn read_binary(reader: &mut WireReader<'_>) -> Result<Self> {
        reader.ensure(TTL_HEADER_LEN, "TTL counting filter header")?;
        let bit_set_size = reader.i32("bit_set_size")?;
        let num_hash_functions = reader.i32("num_hash_functions")?;
        let max_counter_value = reader.i32("max_counter_value")?;
        let seed = reader.i32("seed")?;
        let ttl_slices = reader.i32("ttl_slices")?;
        let slice_unit_millis = reader.i64("slice_unit_millis")?;

        let m = positive_len(bit_set_size, "bit_set_size")?;
        reader.expect_exact(m * 8, "counters and slices")?;
        let counters = reader.i32_vec(m, "counters")?;
        let last_update_slices = reader.i32_vec(m, "last update slices")?;

        Ok(Self {
            bit_set_size,
            num_hash_functions,
            max_counter_value,
            seed,
            ttl_slices,
            slice_unit_millis,
            counters,
            last_update_slices,
        })
    }

    fn validate(&self) -> Result<()> {
        self.check()
    }
}

impl WireRecord for ScalableBloomFilterData {
    fn write_binary(&self, buf: &mut BytesMut) {
        let name = self.growth_strategy.as_bytes();
        buf.put_i32(self.initial_expected_insertions);
        buf.put_f64(self.false_positive_probability);
        buf.put_i32(self.seed);
        buf.put_i32(name.len() as i32);
        buf.put_slice(name);
        buf.put_i32(self.filters.len() as i32);

        for filter in &self.filters {
            buf.reserve(PLAIN_HEADER_LEN + 4 + filter.bit_array.len() * 8);
            buf.put_i32(filter.bit_set_size);
            buf.put_i32(filter.num_hash_functions);
            buf.put_i32(filter.seed);
            buf.put_f64(filter.false_positive_probability);
            buf.put_i32(filter.bit_array.len() as i32);
            for &word in &filter.bit_array {
                buf.put_u64(word);
            }
        }
    }

    fn read_binary(reader: &mut WireReader<'_>) -> Result<Self> {
        let initial_expected_insertions =
            reader.i32("initial_expected_insertions")?;
        let false_positive_probability = reader.f64("fpp")?;
        let seed = reader.i32("seed")?;

        let name_len = reader.i32("growth strategy name length")?;
        let name_len = usize::try_from(name_len).map_err(|_| {
            BloomError::Deserialization(format!(
                "Negative growth strategy name length: {name_len}"
            ))
        })?;
        let name = reader.bytes(name_len, "growth strategy name")?;
        let growth_strategy = String::from_utf8(name.to_vec()).map_err(|e| {
            BloomError::Deserialization(format!(
                "Growth strategy name is not UTF-8: {e}"
            ))
        })?;

        let count = positive_len(reader.i32("filter count")?, "filter count")?;
        let mut filters = Vec::new();
        for i in 0..count {
            let what = format!("member filter {i}");
            let bit_set_size = reader.i32(&what)?;
            let num_hash_functions = reader.i32(&what)?;
            let filter_seed = reader.i32(&what)?;
            let filter_fpp = reader.f64(&what)?;
            let array_size = reader.i32(&what)?;
            let array_size = usize::try_from(array_size).map_err(|_| {
                BloomError::Deserialization(format!(
                    "Negative word count {array_size} in {what}"
                ))
            })?;
            let bit_array = reader.u64_vec(array_size, &what)?;
            filters.push(BloomFilterData {
                bit_set_size,
                num_hash_functions,
                seed: filter_seed,
                false_positive_probability: filter_fpp,
                bit_array,
            });
        }

        Ok(Self {
            initial_expected_insertions,
            false_positive_probability,
            seed,
            growth_strategy,
            filters,
        })
    }

    fn validate(&self) -> Result<()> {
        self.check()
    }
}
