use kbloom::{
    BloomError, BloomFilterStats, CountingBloomFilter,
    CountingBloomFilterConfigBuilder, to_bytes,
};

// Helper function to create a counting filter for testing
fn create_test_filter(
    bit_set_size: usize,
    num_hash_functions: usize,
    max_counter_value: u32,
) -> CountingBloomFilter<str> {
    let config = CountingBloomFilterConfigBuilder::default()
        .bit_set_size(bit_set_size)
        .num_hash_functions(num_hash_functions)
        .max_counter_value(max_counter_value)
        .build()
        .expect("Failed to build test config");

    CountingBloomFilter::create(config, to_bytes::utf8())
        .expect("Failed to create test filter")
}

fn generate_test_items(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("counted_{i:05}")).collect()
}

#[cfg(test)]
mod basic_operations_tests {
    use super::*;

    #[test]
    fn test_put_remove_round_trip() {
        let mut filter = create_test_filter(1000, 4, 255);

        filter.put("apple");
        assert!(filter.might_contain("apple"));

        filter.remove("apple");
        assert!(!filter.might_contain("apple"));
        assert_eq!(filter.counter_sum(), 0);
    }

    #[test]
    fn test_count_tracks_multiplicity() {
        let mut filter = create_test_filter(1000, 4, 255);

        filter.put("twice");
        filter.put("twice");

        assert!(filter.count("twice") >= 2);
        assert_eq!(filter.count("never"), 0);

        filter.remove("twice");
        assert!(filter.count("twice") >= 1);
        assert!(filter.might_contain("twice"));
    }

    #[test]
    fn test_remove_of_absent_element_keeps_counters_at_zero() {
        let mut filter = create_test_filter(500, 3, 255);

        filter.remove("ghost");
        filter.remove("ghost");

        assert!(filter.counters().iter().all(|&c| c == 0));
        filter.put("ghost");
        assert!(filter.might_contain("ghost"));
    }

    #[test]
    fn test_remove_leaves_other_elements() {
        let mut filter = create_test_filter(10_000, 4, 255);
        let items = generate_test_items(200);
        filter.put_all(items.iter().map(String::as_str));

        filter.remove(&items[0]);

        for item in &items[1..] {
            assert!(filter.might_contain(item), "Lost {item}");
        }
    }

    #[test]
    fn test_clear() {
        let mut filter = create_test_filter(1000, 4, 255);
        filter.put_all(["a", "b", "c"]);

        filter.clear();

        assert_eq!(filter.counter_sum(), 0);
        assert!(!filter.might_contain_all(["a", "b", "c"]));
    }
}

#[cfg(test)]
mod saturation_tests {
    use super::*;

    #[test]
    fn test_counters_saturate_at_max() {
        let mut filter = create_test_filter(1000, 4, 3);

        for _ in 0..8 {
            filter.put("hot");
        }

        assert_eq!(filter.count("hot"), 3);
        assert!(filter.counters().iter().all(|&c| c <= 3));
    }

    #[test]
    fn test_saturated_element_can_be_drained() {
        let mut filter = create_test_filter(1000, 4, 3);
        for _ in 0..8 {
            filter.put("hot");
        }

        for _ in 0..3 {
            filter.remove("hot");
        }

        assert_eq!(filter.count("hot"), 0);
        assert!(!filter.might_contain("hot"));
    }
}

#[cfg(test)]
mod stats_tests {
    use super::*;

    #[test]
    fn test_memory_is_four_bytes_per_counter() {
        let filter = create_test_filter(1000, 4, 255);
        assert_eq!(filter.estimated_memory_usage(), 4000);
        assert_eq!(filter.bit_set_size(), 1000);
    }

    #[test]
    fn test_non_zero_counters_drive_estimates() {
        let mut filter = create_test_filter(10_000, 4, 255);
        for item in generate_test_items(300) {
            filter.put(&item);
        }

        let estimate = filter.estimate_current_elements();
        assert!((250.0..=350.0).contains(&estimate), "estimate {estimate}");
        assert!(filter.fill_ratio() > 0.0);
    }

    #[test]
    fn test_optimal_size_builder() {
        let config = CountingBloomFilterConfigBuilder::default()
            .optimal_size(1000, 0.01)
            .unwrap()
            .build()
            .unwrap();
        let filter =
            CountingBloomFilter::create(config, to_bytes::utf8()).unwrap();

        assert_eq!(filter.bit_set_size(), 9586);
        assert_eq!(filter.num_hash_functions(), 7);
    }

    #[test]
    fn test_restore_rejects_mismatched_counters() {
        let config = CountingBloomFilterConfigBuilder::default()
            .bit_set_size(10)
            .build()
            .unwrap();
        let result =
            CountingBloomFilter::restore(config, vec![0; 9], to_bytes::utf8());

        assert!(matches!(result, Err(BloomError::InvalidConfig(_))));
    }
}
