use crate::error::{BloomError, Result};
use bitvec::{order::Lsb0, vec::BitVec};

/// Fixed-length bit vector packed into 64-bit words.
///
/// Bit `i` lives in word `i >> 6` at position `i & 63` (least significant
/// bit first), which is exactly the layout the binary formats persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordBitArray {
    bits: BitVec<u64, Lsb0>,
}

impl WordBitArray {
    pub fn new(size: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, size),
        }
    }

    /// Rebuilds an array from persisted words. The word count must be
    /// exactly `ceil(size / 64)`.
    pub fn from_words(size: usize, words: Vec<u64>) -> Result<Self> {
        let expected = Self::word_count(size);
        if words.len() != expected {
            return Err(BloomError::InvalidConfig(format!(
                "Bit array needs {expected} words for {size} bits, got {}",
                words.len()
            )));
        }
        let mut bits = BitVec::from_vec(words);
        bits.truncate(size);
        Ok(Self { bits })
    }

    pub fn word_count(size: usize) -> usize {
        size.div_ceil(64)
    }

    pub fn set(&mut self, index: usize) {
        self.bits.set(index, true);
    }

    pub fn get(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    pub fn count_set_bits(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn words(&self) -> &[u64] {
        self.bits.as_raw_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_layout() {
        let mut array = WordBitArray::new(130);
        array.set(0);
        array.set(63);
        array.set(64);
        array.set(129);

        let words = array.words();
        assert_eq!(words.len(), 3);
        assert_eq!(words[0], 1 | (1 << 63));
        assert_eq!(words[1], 1);
        assert_eq!(words[2], 1 << 1);
    }

    #[test]
    fn test_get_set_and_count() {
        let mut array = WordBitArray::new(100);
        assert_eq!(array.count_set_bits(), 0);
        assert!(!array.get(42));

        array.set(42);
        array.set(42);
        array.set(99);
        assert!(array.get(42));
        assert!(array.get(99));
        assert!(!array.get(41));
        assert_eq!(array.count_set_bits(), 2);
    }

    #[test]
    fn test_clear_resets_every_bit() {
        let mut array = WordBitArray::new(256);
        for i in (0..256).step_by(3) {
            array.set(i);
        }
        array.clear();
        assert_eq!(array.count_set_bits(), 0);
        assert!(array.words().iter().all(|&w| w == 0));
    }

    #[test]
    fn test_from_words_restores_bits() {
        let mut original = WordBitArray::new(200);
        original.set(7);
        original.set(150);

        let restored =
            WordBitArray::from_words(200, original.words().to_vec()).unwrap();
        assert_eq!(restored, original);
        assert!(restored.get(7));
        assert!(restored.get(150));
    }

    #[test]
    fn test_from_words_rejects_wrong_length() {
        let result = WordBitArray::from_words(200, vec![0; 3]);
        assert!(matches!(result, Err(BloomError::InvalidConfig(_))));
    }
}
