//! Sizing and estimation formulas shared by every filter variant.
//!
//! All estimators guard against `m == 0` / `k == 0` by returning 0 and never
//! panic on boundary probabilities; restored filters may carry any `fpp`.
use std::f64::consts::LN_2;

/// Bytes added on top of the packed bit array when estimating memory.
pub const MEMORY_OVERHEAD_BYTES: u64 = 16;

/// `m = ceil(-n * ln(fpp) / ln(2)^2)`
pub fn optimal_bit_set_size(n: usize, fpp: f64) -> usize {
    ((-(n as f64) * fpp.ln()) / (LN_2 * LN_2)).ceil() as usize
}

/// `k = max(1, round(m / n * ln(2)))`
pub fn optimal_num_hash_functions(n: usize, m: usize) -> usize {
    if n == 0 {
        return 1;
    }
    let k = ((m as f64 / n as f64) * LN_2).round() as usize;
    k.max(1)
}

/// `n ≈ -(m / k) * ln(1 - x / m)` for `x` set bits, infinite when every
/// bit is set.
pub fn estimate_current_elements(set_bits: usize, m: usize, k: usize) -> f64 {
    if m == 0 || k == 0 {
        return 0.0;
    }
    if set_bits >= m {
        return f64::INFINITY;
    }
    let fraction = set_bits as f64 / m as f64;
    -(m as f64 / k as f64) * (1.0 - fraction).ln()
}

/// `p ≈ (1 - e^(-k * n / m))^k`
pub fn estimate_false_positive_rate(k: usize, n: f64, m: usize) -> f64 {
    if m == 0 || k == 0 || n <= 0.0 {
        return 0.0;
    }
    let exponent = -(k as f64 * n) / m as f64;
    (1.0 - exponent.exp()).powi(k as i32)
}

pub fn calculate_fill_ratio(set_bits: usize, m: usize) -> f64 {
    if m == 0 {
        return 0.0;
    }
    set_bits as f64 / m as f64
}

/// `ceil(m / 8) + MEMORY_OVERHEAD_BYTES`
pub fn estimate_memory_usage(m: usize) -> u64 {
    (m as u64).div_ceil(8) + MEMORY_OVERHEAD_BYTES
}

/// `floor(-m * ln(2)^2 / ln(target_fpp))`, the number of insertions `m` bits
/// can absorb before the expected rate exceeds `target_fpp`.
pub fn estimate_max_capacity(m: usize, target_fpp: f64) -> usize {
    if m == 0 || target_fpp <= 0.0 || target_fpp >= 1.0 {
        return 0;
    }
    (-(m as f64) * LN_2 * LN_2 / target_fpp.ln()).floor() as usize
}

/// Largest bit array fitting in `max_memory_bytes`, with the matching
/// optimal hash count for `n` insertions.
pub fn optimal_parameters_for_memory(
    n: usize,
    max_memory_bytes: u64,
) -> (usize, usize) {
    let m = (max_memory_bytes.saturating_mul(8)) as usize;
    (m, optimal_num_hash_functions(n, m))
}
