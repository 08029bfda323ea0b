// Property-based tests for the scoring statistics and naming helpers

use benchscore::record::Sample;
use benchscore::scoring::statistics::{change, probability, rchange, variability, zscore};
use benchscore::scoring::{mid_index, normalize_name, reduce_set, truncate_name};
use proptest::prelude::*;

fn sample(rate: i64, run: usize) -> Sample {
    Sample {
        benchmark_name: "Where- 2 Filters".to_string(),
        origin: "deephaven-engine".to_string(),
        timestamp: 0,
        test_duration: 10.0,
        op_duration: 1.0,
        op_rate: rate,
        row_count: 100,
        set_id: "deephaven/2024-03-01".to_string(),
        run_id: format!("run-{}", run),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Identical rates have no spread
    #[test]
    fn prop_identical_rates_zero_variability(rate in 0.0f64..1e9, n in 1usize..20) {
        let rates = vec![rate; n];
        prop_assert_eq!(variability(&rates), 0.0);
    }

    /// Negative sentinels are dropped, leaving nothing to measure
    #[test]
    fn prop_all_negative_rates_zero_variability(rates in prop::collection::vec(-1e9f64..-0.5, 0..20)) {
        prop_assert_eq!(variability(&rates), 0.0);
        prop_assert_eq!(zscore(100.0, &rates), 0.0);
    }

    /// Variability is never negative
    #[test]
    fn prop_variability_non_negative(rates in prop::collection::vec(-1e6f64..1e9, 0..30)) {
        prop_assert!(variability(&rates) >= 0.0);
    }

    /// A sample at the baseline mean scores 0
    #[test]
    fn prop_zscore_at_mean_is_zero(rates in prop::collection::vec(1i64..1_000_000, 1..20)) {
        let baseline: Vec<f64> = rates.iter().map(|r| *r as f64).collect();
        let m = baseline.iter().sum::<f64>() / baseline.len() as f64;
        prop_assert!(zscore(m, &baseline).abs() < 1e-6);
    }

    /// Two-tailed probability is symmetric and bounded
    #[test]
    fn prop_probability_symmetric(z in -40.0f64..40.0) {
        let p = probability(z);
        prop_assert!((0.0..=1.0).contains(&p));
        prop_assert!((p - probability(-z)).abs() < 1e-12);
    }

    /// Larger deviations are never less significant
    #[test]
    fn prop_probability_monotonic(a in 0.0f64..10.0, b in 0.0f64..10.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(probability(hi) <= probability(lo) + 1e-12);
    }

    /// No change against a baseline of the same value
    #[test]
    fn prop_change_against_self_is_zero(rate in 0.0f64..1e9) {
        prop_assert_eq!(change(rate, &[rate]), 0.0);
    }

    /// Sequential change of a flat series is 0, and short series are 0
    #[test]
    fn prop_rchange_flat_series(rate in 0.0f64..1e9, n in 0usize..20) {
        prop_assert_eq!(rchange(&vec![rate; n]), 0.0);
    }

    /// The representative index always lies inside the run list
    #[test]
    fn prop_mid_index_in_bounds(len in 1usize..1000) {
        let mid = mid_index(len);
        prop_assert!(mid < len);
        prop_assert!(mid >= (len - 1) / 2);
    }

    /// The reduced record is one of the runs, and half of the runs are at or below it
    #[test]
    fn prop_reduced_rate_is_a_run(rates in prop::collection::vec(0i64..1_000_000, 1..15)) {
        let samples: Vec<Sample> = rates.iter().enumerate().map(|(i, r)| sample(*r, i)).collect();
        let refs: Vec<&Sample> = samples.iter().collect();
        let record = reduce_set(&refs).unwrap();
        prop_assert!(rates.contains(&record.op_rate));
        prop_assert_eq!(record.set_op_rates.len(), rates.len());
        let at_or_below = rates.iter().filter(|r| **r <= record.op_rate).count();
        prop_assert!(at_or_below > rates.len() / 2);
    }

    /// Truncated names fit the width and keep short names intact
    #[test]
    fn prop_truncate_fits_width(name in "[ -~]{0,80}", width in 0usize..60) {
        let truncated = truncate_name(&name, width);
        prop_assert!(truncated.chars().count() <= width);
        if name.chars().count() <= width {
            prop_assert_eq!(truncated, name);
        } else if width > 3 {
            prop_assert!(truncated.ends_with("..."));
        }
    }

    /// Normalized names only use the column-safe alphabet
    #[test]
    fn prop_normalize_name_charset(name in "\\PC{0,40}") {
        let normalized = normalize_name(&name);
        prop_assert!(normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'));
    }
}

#[test]
fn test_probability_at_zero_is_one() {
    assert!((probability(0.0) - 1.0).abs() < 1e-15);
}

#[test]
fn test_rchange_known_values() {
    assert_eq!(rchange(&[]), 0.0);
    assert_eq!(rchange(&[42.0]), 0.0);
    assert_eq!(rchange(&[0.0, 0.0, 5.0]), 0.0);
    assert!((rchange(&[100.0, 110.0, 126.0]) - 0.2).abs() < 1e-12);
}

#[test]
fn test_mid_index_even_picks_upper_middle() {
    assert_eq!(mid_index(1), 0);
    assert_eq!(mid_index(2), 1);
    assert_eq!(mid_index(3), 1);
    assert_eq!(mid_index(4), 2);
}
