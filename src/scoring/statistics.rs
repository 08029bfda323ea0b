// Guarded descriptive statistics for benchmark rates
//
// Every ratio here divides by a mean or a standard deviation. A zero divisor
// yields 0 rather than NaN or an error, and negative rates are invalid
// sentinels that are dropped before dispersion and significance statistics.
//
// All values are fractions; percentage scaling belongs to the report layer.

use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

/// Rates usable for dispersion/significance (negative sentinels dropped)
pub fn valid_rates(rates: &[f64]) -> Vec<f64> {
    rates.iter().copied().filter(|r| *r >= 0.0).collect()
}

/// Convert integral rates for the statistics functions
pub fn as_f64(rates: &[i64]) -> Vec<f64> {
    rates.iter().map(|r| *r as f64).collect()
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by n), 0 for an empty slice
pub fn pstdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Coefficient of variation of the valid rates: `pstdev / mean`
///
/// # Example
/// ```
/// use benchscore::scoring::statistics::variability;
///
/// assert_eq!(variability(&[100.0, 100.0, 100.0]), 0.0);
/// assert!((variability(&[100.0, 110.0]) - 5.0 / 105.0).abs() < 1e-12);
/// assert_eq!(variability(&[-1.0, -2.0]), 0.0);
/// ```
pub fn variability(rates: &[f64]) -> f64 {
    let rates = valid_rates(rates);
    let m = mean(&rates);
    if m == 0.0 {
        return 0.0;
    }
    pstdev(&rates) / m
}

/// Fractional change of `current` against the mean of the valid baseline rates
pub fn change(current: f64, baseline: &[f64]) -> f64 {
    let m = mean(&valid_rates(baseline));
    if m == 0.0 {
        return 0.0;
    }
    (current - m) / m
}

/// Fractional gain from `start` to `end`
pub fn gain(start: f64, end: f64) -> f64 {
    if start == 0.0 {
        return 0.0;
    }
    (end - start) / start
}

/// Sequential change: the last value against the mean of all earlier values
///
/// Values are ordered oldest to newest. Fewer than two values yield 0.
///
/// # Example
/// ```
/// use benchscore::scoring::statistics::rchange;
///
/// assert_eq!(rchange(&[]), 0.0);
/// assert_eq!(rchange(&[5.0]), 0.0);
/// assert_eq!(rchange(&[10.0, 10.0, 20.0]), 1.0);
/// ```
pub fn rchange(values: &[f64]) -> f64 {
    let Some((last, earlier)) = values.split_last() else {
        return 0.0;
    };
    if earlier.is_empty() {
        return 0.0;
    }
    let m = mean(earlier);
    if m == 0.0 {
        return 0.0;
    }
    (last - m) / m
}

/// Standard score of `current` against the valid baseline rates
///
/// A baseline without spread (or without valid rates) scores 0.
pub fn zscore(current: f64, baseline: &[f64]) -> f64 {
    let rates = valid_rates(baseline);
    let std = pstdev(&rates);
    if std == 0.0 {
        return 0.0;
    }
    (current - mean(&rates)) / std
}

/// Standard normal cumulative distribution function
pub fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Two-tailed probability of a deviation at least as extreme as `z`
///
/// `1 - (Φ(|z|) - Φ(-|z|))`. Lower means more significant; `probability(0) == 1`.
pub fn probability(z: f64) -> f64 {
    let upper = z.abs();
    1.0 - (standard_normal_cdf(upper) - standard_normal_cdf(-upper))
}

/// Whether a score reaches the hit threshold in either direction
pub fn is_hit(score: f64, threshold: f64) -> bool {
    score <= -threshold || score >= threshold
}
