//! Element-to-bytes projections.
//!
//! Filters never decide how a domain value becomes bytes; the caller injects
//! a [`ToBytes`] function. The helpers below cover the common cases with a
//! fixed, documented encoding so that a filter persisted by one process can be
//! queried by another.
use std::sync::Arc;

/// Projection from an element to the bytes that get hashed.
pub type ToBytes<T> = Arc<dyn Fn(&T) -> Vec<u8> + Send + Sync>;

/// Wraps any closure as a projection.
pub fn from_fn<T, F>(f: F) -> ToBytes<T>
where
    T: ?Sized,
    F: Fn(&T) -> Vec<u8> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// UTF-8 bytes of a string slice.
pub fn utf8() -> ToBytes<str> {
    Arc::new(|value: &str| value.as_bytes().to_vec())
}

/// UTF-8 bytes of an owned string.
pub fn string() -> ToBytes<String> {
    Arc::new(|value: &String| value.as_bytes().to_vec())
}

/// The bytes themselves.
pub fn raw() -> ToBytes<[u8]> {
    Arc::new(|value: &[u8]| value.to_vec())
}

pub fn i32_be() -> ToBytes<i32> {
    Arc::new(|value: &i32| value.to_be_bytes().to_vec())
}

pub fn i64_be() -> ToBytes<i64> {
    Arc::new(|value: &i64| value.to_be_bytes().to_vec())
}

pub fn u64_be() -> ToBytes<u64> {
    Arc::new(|value: &u64| value.to_be_bytes().to_vec())
}

/// IEEE-754 bit pattern, big-endian.
pub fn f32_be() -> ToBytes<f32> {
    Arc::new(|value: &f32| value.to_be_bytes().to_vec())
}

/// IEEE-754 bit pattern, big-endian.
pub fn f64_be() -> ToBytes<f64> {
    Arc::new(|value: &f64| value.to_be_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_projections_agree() {
        let owned = String::from("héllo");
        assert_eq!(utf8()("héllo"), string()(&owned));
        assert_eq!(utf8()("héllo"), "héllo".as_bytes());
    }

    #[test]
    fn test_numeric_projections_are_big_endian() {
        assert_eq!(i32_be()(&1), vec![0, 0, 0, 1]);
        assert_eq!(i64_be()(&-1), vec![0xFF; 8]);
        assert_eq!(u64_be()(&0x0102), vec![0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(f64_be()(&1.0), 1.0f64.to_bits().to_be_bytes().to_vec());
        assert_eq!(f32_be()(&1.5), 1.5f32.to_bits().to_be_bytes().to_vec());
    }

    #[test]
    fn test_raw_and_custom_projection() {
        assert_eq!(raw()(&[1u8, 2, 3][..]), vec![1, 2, 3]);

        let lowercase =
            from_fn(|value: &str| value.to_lowercase().into_bytes());
        assert_eq!(lowercase("ABC"), b"abc".to_vec());
    }
}
