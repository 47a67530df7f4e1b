// Helper method to format bytes in human-readable form
pub fn bytes2hr(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let value = bytes as f64;
    if value < KB {
        format!("{bytes} bytes")
    } else if value < KB * KB {
        format!("{:.2} KB", value / KB)
    } else if value < KB * KB * KB {
        format!("{:.2} MB", value / (KB * KB))
    } else {
        format!("{:.2} GB", value / (KB * KB * KB))
    }
}

pub fn bits2hr(bits: usize) -> String {
    bytes2hr((bits as u64).div_ceil(8))
}

/// Renders a ratio in `[0, 1]` as a percentage with two decimals.
pub fn ratio2hr(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes2hr_units() {
        assert_eq!(bytes2hr(0), "0 bytes");
        assert_eq!(bytes2hr(1023), "1023 bytes");
        assert_eq!(bytes2hr(1024), "1.00 KB");
        assert_eq!(bytes2hr(1536), "1.50 KB");
        assert_eq!(bytes2hr(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(bytes2hr(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_bits2hr_rounds_up_to_bytes() {
        assert_eq!(bits2hr(1), "1 bytes");
        assert_eq!(bits2hr(8 * 1024), "1.00 KB");
    }

    #[test]
    fn test_ratio2hr() {
        assert_eq!(ratio2hr(0.5), "50.00%");
        assert_eq!(ratio2hr(0.01234), "1.23%");
    }
}
