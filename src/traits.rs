/// Read-only statistics shared by the plain, counting and scalable filters.
///
/// The TTL counting filter does not implement this: its load depends on the
/// observation time, so it exposes `*_at(now)` estimators instead.
pub trait BloomFilterStats {
    /// Total storage slots (bits or counters).
    fn bit_set_size(&self) -> usize;

    /// Occupied slots: set bits, or non-zero counters.
    fn set_bits_count(&self) -> usize;

    fn estimate_current_elements(&self) -> f64;

    fn estimate_false_positive_rate(&self) -> f64;

    fn fill_ratio(&self) -> f64 {
        crate::sizing::calculate_fill_ratio(
            self.set_bits_count(),
            self.bit_set_size(),
        )
    }

    fn estimated_memory_usage(&self) -> u64;
}
