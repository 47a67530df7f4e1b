use crate::to_bytes::ToBytes;
use murmur3::murmur3_32;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

/// A seeded 32-bit hash over a byte slice.
///
/// Implementations must be pure functions of `(bytes, seed)`: the same input
/// has to produce the same value in every process, otherwise persisted filters
/// stop answering correctly after a restore.
pub trait HashFunction: fmt::Debug + Send + Sync {
    fn hash(&self, bytes: &[u8], seed: i32) -> i32;
}

/// MurmurHash3, x86 32-bit variant.
#[derive(Debug, Default, Clone, Copy)]
pub struct Murmur3;

impl HashFunction for Murmur3 {
    fn hash(&self, bytes: &[u8], seed: i32) -> i32 {
        let mut cursor = Cursor::new(bytes);
        murmur3_32(&mut cursor, seed as u32)
            .expect("Failed to compute Murmur3 hash") as i32
    }
}

/// Standard xxHash32, as produced by the reference C implementation.
///
/// Variants that fold the final avalanche as `h ^ ((h >> 15) * PRIME2)`
/// or that sign-extend tail bytes yield different hashes for the same
/// input. Filters persisted with such a variant will not index the same
/// way here and must be rebuilt rather than deserialized.
#[derive(Debug, Default, Clone, Copy)]
pub struct XxHash32;

impl HashFunction for XxHash32 {
    fn hash(&self, bytes: &[u8], seed: i32) -> i32 {
        twox_hash::XxHash32::oneshot(seed as u32, bytes) as i32
    }
}

pub(crate) fn default_hash_function() -> Arc<dyn HashFunction> {
    Arc::new(Murmur3)
}

/// Maps a raw 32-bit hash into `[0, m)`.
///
/// Negative hashes have their sign bit masked off before the modulus, so
/// the remaining 31 bits all contribute to the index.
pub fn fold_index(hash: i32, bit_set_size: usize) -> usize {
    let non_negative = if hash < 0 { hash & i32::MAX } else { hash };
    non_negative as usize % bit_set_size
}

/// Derives the `k` storage indices of an element.
///
/// Round `i` hashes the element's bytes with seed `seed + i` (wrapping), then
/// folds the result with [`fold_index`]. Every filter variant shares this.
pub struct IndexHasher<T: ?Sized> {
    hash_function: Arc<dyn HashFunction>,
    to_bytes: ToBytes<T>,
    seed: i32,
    num_hashes: usize,
    bit_set_size: usize,
}

impl<T: ?Sized> IndexHasher<T> {
    pub fn new(
        hash_function: Arc<dyn HashFunction>,
        to_bytes: ToBytes<T>,
        seed: i32,
        num_hashes: usize,
        bit_set_size: usize,
    ) -> Self {
        Self {
            hash_function,
            to_bytes,
            seed,
            num_hashes,
            bit_set_size,
        }
    }

    pub fn indices(&self, value: &T) -> impl Iterator<Item = usize> + '_ {
        let bytes = (self.to_bytes)(value);
        (0..self.num_hashes).map(move |i| {
            let hash = self
                .hash_function
                .hash(&bytes, self.seed.wrapping_add(i as i32));
            fold_index(hash, self.bit_set_size)
        })
    }

    pub fn hash_function(&self) -> &Arc<dyn HashFunction> {
        &self.hash_function
    }

    pub fn to_bytes(&self) -> &ToBytes<T> {
        &self.to_bytes
    }
}

impl<T: ?Sized> Clone for IndexHasher<T> {
    fn clone(&self) -> Self {
        Self {
            hash_function: Arc::clone(&self.hash_function),
            to_bytes: Arc::clone(&self.to_bytes),
            seed: self.seed,
            num_hashes: self.num_hashes,
            bit_set_size: self.bit_set_size,
        }
    }
}

impl<T: ?Sized> fmt::Debug for IndexHasher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexHasher")
            .field("hash_function", &self.hash_function)
            .field("seed", &self.seed)
            .field("num_hashes", &self.num_hashes)
            .field("bit_set_size", &self.bit_set_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_bytes;

    #[test]
    fn test_murmur3_reference_values() {
        assert_eq!(Murmur3.hash(b"", 0), 0);
        assert_eq!(Murmur3.hash(b"", 1) as u32, 0x514E_28B7);
        assert_eq!(
            Murmur3.hash(b"The quick brown fox jumps over the lazy dog", 0)
                as u32,
            0x2E4F_F723
        );
    }

    #[test]
    fn test_xxhash32_reference_values() {
        assert_eq!(XxHash32.hash(b"", 0) as u32, 0x02CC_5D05);
        assert_eq!(XxHash32.hash(b"a", 0) as u32, 0x550D_7456);
        assert_eq!(XxHash32.hash(b"abc", 0) as u32, 0x32D1_53FF);
    }

    #[test]
    fn test_hashes_are_deterministic_and_seeded() {
        let input = b"deterministic input that is longer than sixteen bytes";
        for hasher in [&Murmur3 as &dyn HashFunction, &XxHash32] {
            assert_eq!(hasher.hash(input, 7), hasher.hash(input, 7));
            assert_ne!(hasher.hash(input, 7), hasher.hash(input, 8));
            assert_ne!(hasher.hash(b"abc", 0), hasher.hash(b"abd", 0));
        }
    }

    #[test]
    fn test_fold_index_masks_sign_bit() {
        assert_eq!(fold_index(17, 10), 7);
        assert_eq!(fold_index(0, 10), 0);
        // -1 & i32::MAX == i32::MAX
        assert_eq!(fold_index(-1, 1000), i32::MAX as usize % 1000);
        assert_eq!(fold_index(i32::MIN, 1000), 0);
        for hash in [i32::MIN, -12345, -1, 0, 1, i32::MAX] {
            assert!(fold_index(hash, 97) < 97);
        }
    }

    #[test]
    fn test_index_hasher_produces_k_indices_in_range() {
        let hasher = IndexHasher::new(
            Arc::new(Murmur3),
            to_bytes::utf8(),
            42,
            7,
            9586,
        );
        let first: Vec<usize> = hasher.indices("apple").collect();
        let second: Vec<usize> = hasher.indices("apple").collect();

        assert_eq!(first.len(), 7);
        assert!(first.iter().all(|&i| i < 9586));
        assert_eq!(first, second);
    }

    #[test]
    fn test_index_hasher_seed_wraps() {
        let hasher = IndexHasher::new(
            Arc::new(XxHash32),
            to_bytes::utf8(),
            i32::MAX,
            3,
            64,
        );
        let expected: Vec<usize> = [i32::MAX, i32::MIN, i32::MIN + 1]
            .into_iter()
            .map(|seed| fold_index(XxHash32.hash(b"wrap", seed), 64))
            .collect();
        assert_eq!(hasher.indices("wrap").collect::<Vec<_>>(), expected);
    }
}
