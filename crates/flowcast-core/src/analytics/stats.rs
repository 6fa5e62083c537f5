//! Statistical primitives
//!
//! Population statistics (divide by N), order-statistic percentiles, and the
//! recency-weighted dampened growth rate used by forecasts. Every ratio
//! guards its denominator and yields 0 rather than NaN.

use crate::config::GrowthConfig;

/// Arithmetic mean (0 for empty input)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median with the even/odd midpoint rule (0 for empty input)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population variance: mean of squared deviations
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Standard deviation over mean; 0 unless the mean is positive
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m > 0.0 {
        std_dev(values) / m
    } else {
        0.0
    }
}

/// Order-statistic percentile of unsorted values, `p` in [0, 1]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    percentile_sorted(&sorted(values), p)
}

/// Order-statistic percentile of already sorted values
///
/// Index is `floor(N × p)` clamped to the last element. No interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (sorted.len() as f64 * p).floor().max(0.0) as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Ascending copy using a total order (NaN-safe)
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Percent change from `previous` to `current`
///
/// A zero (or negative) baseline reports 100% when something appeared and
/// 0% otherwise.
pub fn change_percentage(previous: f64, current: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    }
}

/// Direction of a percent change relative to a symmetric threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
    Flat,
}

pub fn classify_change(change_pct: f64, threshold_pct: f64) -> Movement {
    if change_pct > threshold_pct {
        Movement::Up
    } else if change_pct < -threshold_pct {
        Movement::Down
    } else {
        Movement::Flat
    }
}

/// Recency-weighted, outlier-clamped growth rate scaled by a dampening factor
///
/// `totals` must be chronological. Each consecutive pair contributes
/// `(curr - prev) / prev` clamped to `[-clamp, clamp]`, weighted 1, 2, 3, ...
/// so the most recent change weighs most. Pairs without a positive baseline
/// are skipped. With no usable pair the neutral default rate is returned.
pub fn dampened_growth_rate(totals: &[f64], config: &GrowthConfig) -> f64 {
    if totals.len() < 2 {
        return config.default_rate;
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for (i, pair) in totals.windows(2).enumerate() {
        let (prev, curr) = (pair[0], pair[1]);
        if prev <= 0.0 {
            continue;
        }
        let rate = ((curr - prev) / prev).clamp(-config.clamp, config.clamp);
        let weight = (i + 1) as f64;
        weighted_sum += rate * weight;
        weight_total += weight;
    }

    if weight_total == 0.0 {
        return config.default_rate;
    }

    (weighted_sum / weight_total) * config.dampening
}

/// Round a currency amount to cents
pub fn round_currency(value: f64) -> f64 {
    round_to(value, 2)
}

/// Round a percentage to two decimals
pub fn round_pct(value: f64) -> f64 {
    round_to(value, 2)
}

/// Round a percentage to one decimal
pub fn round_pct1(value: f64) -> f64 {
    round_to(value, 1)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // Avoid "-0.00" in payloads
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn growth() -> GrowthConfig {
        GrowthConfig::default()
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_median_equals_mean_for_repeated_value() {
        let values = vec![42.5; 7];
        assert_eq!(median(&values), mean(&values));
        let values = vec![42.5; 6];
        assert_eq!(median(&values), mean(&values));
    }

    #[test]
    fn test_population_variance_divides_by_n() {
        // Sample variance would be 2.5; population variance is 2.0
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((variance(&values) - 2.0).abs() < 1e-12);
        assert!((std_dev(&values) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_coefficient_of_variation_guards_non_positive_mean() {
        assert_eq!(coefficient_of_variation(&[]), 0.0);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[-5.0, 1.0]), 0.0);
        let cv = coefficient_of_variation(&[10.0, 20.0]);
        assert!((cv - 5.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_is_truncating_order_statistic() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        // floor(10 * 0.25) = 2 -> third smallest
        assert_eq!(percentile(&values, 0.25), 3.0);
        assert_eq!(percentile(&values, 0.5), 6.0);
        assert_eq!(percentile(&values, 0.0), 1.0);
        // floor(10 * 1.0) = 10 clamps to the last index
        assert_eq!(percentile(&values, 1.0), 10.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_change_percentage_zero_baseline() {
        assert_eq!(change_percentage(0.0, 50.0), 100.0);
        assert_eq!(change_percentage(0.0, 0.0), 0.0);
        assert!((change_percentage(200.0, 150.0) + 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_classify_change_thresholds() {
        assert_eq!(classify_change(5.1, 5.0), Movement::Up);
        assert_eq!(classify_change(5.0, 5.0), Movement::Flat);
        assert_eq!(classify_change(-5.0, 5.0), Movement::Flat);
        assert_eq!(classify_change(-5.1, 5.0), Movement::Down);
    }

    #[test]
    fn test_dampened_growth_two_periods() {
        // rates = [0.10], weights = [1] -> 0.10 * 0.7
        let rate = dampened_growth_rate(&[100.0, 110.0], &growth());
        assert!((rate - 0.07).abs() < 1e-12);
    }

    #[test]
    fn test_dampened_growth_constant_series() {
        let totals = [100.0, 110.0, 121.0, 133.1, 146.41];
        let rate = dampened_growth_rate(&totals, &growth());
        assert!((rate - 0.07).abs() < 1e-9);
    }

    #[test]
    fn test_dampened_growth_weights_recent_changes() {
        // rates [0.0, 0.2] with weights [1, 2] -> 0.4 / 3
        let rate = dampened_growth_rate(&[100.0, 100.0, 120.0], &growth());
        assert!((rate - (0.4 / 3.0) * 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_dampened_growth_clamps_outliers() {
        // +300% clamps to +50%
        let rate = dampened_growth_rate(&[100.0, 400.0], &growth());
        assert!((rate - 0.35).abs() < 1e-12);
        // -90% clamps to -50%
        let rate = dampened_growth_rate(&[100.0, 10.0], &growth());
        assert!((rate + 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_dampened_growth_defaults() {
        assert_eq!(dampened_growth_rate(&[], &growth()), 0.02);
        assert_eq!(dampened_growth_rate(&[500.0], &growth()), 0.02);
        // No positive baseline anywhere
        assert_eq!(dampened_growth_rate(&[0.0, 0.0, 10.0], &growth()), 0.02);
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round_currency(7.333333), 7.33);
        assert_eq!(round_pct1(12.345), 12.3);
        assert_eq!(round_currency(-0.001), 0.0);
        assert_eq!(round_currency(f64::NAN), 0.0);
    }
}
