use kbloom::{
    TtlCountingBloomFilter, TtlCountingBloomFilterConfigBuilder, to_bytes,
};
use std::time::Duration;

// A fixed reference time; slice index 1_700_000_000 fits in 32 bits
const T0: u64 = 1_700_000_000_000;
const SECOND: u64 = 1_000;

// Helper function to create a TTL filter with one-second slices
fn create_test_filter(ttl_secs: u64) -> TtlCountingBloomFilter<str> {
    let config = TtlCountingBloomFilterConfigBuilder::default()
        .bit_set_size(2_000)
        .num_hash_functions(4)
        .max_counter_value(255)
        .ttl(Duration::from_secs(ttl_secs))
        .slice_unit(Duration::from_secs(1))
        .build()
        .expect("Failed to build test config");

    TtlCountingBloomFilter::create(config, to_bytes::utf8())
        .expect("Failed to create test filter")
}

#[cfg(test)]
mod expiry_tests {
    use super::*;

    #[test]
    fn test_element_alive_through_ttl_boundary() {
        let mut filter = create_test_filter(10);
        filter.put_at("session", T0);

        assert!(filter.might_contain_at("session", T0));
        assert!(filter.might_contain_at("session", T0 + 5 * SECOND));
        // age == ttl_slices is still fresh
        assert!(filter.might_contain_at("session", T0 + 10 * SECOND));
        assert!(!filter.might_contain_at("session", T0 + 11 * SECOND));
    }

    #[test]
    fn test_count_is_zero_once_expired() {
        let mut filter = create_test_filter(10);
        filter.put_at("x", T0);
        filter.put_at("x", T0);

        assert!(filter.count_at("x", T0 + SECOND) >= 2);
        assert_eq!(filter.count_at("x", T0 + 60 * SECOND), 0);
    }

    #[test]
    fn test_refresh_extends_lifetime() {
        let mut filter = create_test_filter(10);
        filter.put_at("kept", T0);
        filter.put_at("kept", T0 + 8 * SECOND);

        assert!(filter.might_contain_at("kept", T0 + 15 * SECOND));
        assert!(!filter.might_contain_at("kept", T0 + 19 * SECOND));
    }

    #[test]
    fn test_stale_counter_restarts_from_zero() {
        let mut filter = create_test_filter(10);
        for _ in 0..5 {
            filter.put_at("burst", T0);
        }

        filter.put_at("burst", T0 + 30 * SECOND);

        assert_eq!(filter.count_at("burst", T0 + 30 * SECOND), 1);
    }

    #[test]
    fn test_reads_do_not_mutate() {
        let mut filter = create_test_filter(10);
        filter.put_at("read", T0);
        let counters = filter.counters().to_vec();
        let slices = filter.last_update_slices().to_vec();

        filter.might_contain_at("read", T0 + 100 * SECOND);
        filter.count_at("read", T0 + 100 * SECOND);

        assert_eq!(filter.counters(), counters.as_slice());
        assert_eq!(filter.last_update_slices(), slices.as_slice());
    }
}

#[cfg(test)]
mod removal_tests {
    use super::*;

    #[test]
    fn test_remove_within_ttl() {
        let mut filter = create_test_filter(10);
        filter.put_at("item", T0);

        filter.remove_at("item", T0 + 2 * SECOND);

        assert!(!filter.might_contain_at("item", T0 + 2 * SECOND));
        assert_eq!(filter.counter_sum(), 0);
    }

    #[test]
    fn test_remove_of_expired_element_clamps_at_zero() {
        let mut filter = create_test_filter(10);
        filter.put_at("old", T0);

        filter.remove_at("old", T0 + 20 * SECOND);

        assert_eq!(filter.counter_sum(), 0);
        assert!(!filter.might_contain_at("old", T0 + 20 * SECOND));
    }
}

#[cfg(test)]
mod maintenance_tests {
    use super::*;

    #[test]
    fn test_cleanup_expired_sweeps_only_stale_counters() {
        let mut filter = create_test_filter(10);
        filter.put_at("early", T0);
        filter.put_at("late", T0 + 8 * SECOND);

        let swept = filter.cleanup_expired_at(T0 + 15 * SECOND);

        assert!(swept > 0 && swept <= filter.num_hash_functions());
        assert!(filter.might_contain_at("late", T0 + 15 * SECOND));
        assert_eq!(
            filter.active_slots_at(T0 + 15 * SECOND),
            filter.counters().iter().filter(|&&c| c > 0).count()
        );
        assert_eq!(filter.cleanup_expired_at(T0 + 15 * SECOND), 0);
    }

    #[test]
    fn test_clear_zeroes_counters_and_slices() {
        let mut filter = create_test_filter(10);
        filter.put_all_at(["a", "b", "c"], T0);

        filter.clear();

        assert!(filter.counters().iter().all(|&c| c == 0));
        assert!(filter.last_update_slices().iter().all(|&s| s == 0));
        assert!(!filter.might_contain_all_at(["a", "b", "c"], T0));
    }

    #[test]
    fn test_estimators_ignore_expired_slots() {
        let mut filter = create_test_filter(10);
        filter.put_all_at(["one", "two", "three"], T0);

        assert!(filter.estimate_current_elements_at(T0) > 0.0);
        assert!(filter.active_fill_ratio_at(T0) > 0.0);
        assert_eq!(filter.estimate_current_elements_at(T0 + 60 * SECOND), 0.0);
        assert_eq!(filter.active_counter_sum_at(T0 + 60 * SECOND), 0);
        assert_eq!(filter.estimated_memory_usage(), 2_000 * 8);
    }

    #[test]
    fn test_wall_clock_operations() {
        let mut filter = create_test_filter(3600);

        filter.put("now").unwrap();
        filter.put_all(["later", "soon"]).unwrap();

        assert!(filter.might_contain("now").unwrap());
        assert!(filter.might_contain_all(["later", "soon"]).unwrap());
        assert!(filter.count("now").unwrap() >= 1);

        filter.remove("now").unwrap();
        assert_eq!(filter.cleanup_expired().unwrap(), 0);
    }

    #[test]
    fn test_ttl_slices_derived_from_config() {
        let filter = create_test_filter(10);
        assert_eq!(filter.ttl_slices(), 10);
        assert_eq!(filter.slice_unit_millis(), 1_000);
        assert_eq!(filter.slice_at(T0 + 999), (T0 / 1_000) as i32);
    }
}
