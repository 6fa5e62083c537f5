//! Deterministic forecast model
//!
//! Splits streams into a fixed part (scheduled amounts converted to a monthly
//! equivalent) and a variable part (monthly totals over a lookback window),
//! then projects forward with a dampened growth rate and widening bands.

use chrono::NaiveDate;

use super::grouping::{group_records, records_from_streams};
use super::periods::{month_start, shift_months};
use super::stats::{dampened_growth_rate, mean, round_currency, std_dev};
use super::types::{FixedStreamContribution, MonthlyProjection};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::{DateRange, Granularity, Stream};

/// Streams with fewer snapshots than this count against data quality
const MIN_SNAPSHOTS_FOR_QUALITY: usize = 3;

/// Everything the projection and the simulator need, computed once
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastInputs {
    pub fixed_monthly: f64,
    pub variable_monthly: f64,
    pub variable_std: f64,
    pub growth_rate: f64,
    pub confidence: f64,
    /// Months with variable activity inside the lookback window
    pub history_months: usize,
    pub fixed_streams: Vec<FixedStreamContribution>,
}

impl ForecastInputs {
    pub fn baseline_monthly(&self) -> f64 {
        self.fixed_monthly + self.variable_monthly
    }

    /// Growth factor `(1 + growth)^month`
    pub fn growth_factor(&self, month: u32) -> f64 {
        (1.0 + self.growth_rate).powi(month as i32)
    }
}

/// Lookback window of `months` calendar months ending today
///
/// Starts at the earliest representable day when the lookback reaches past it.
pub fn lookback_window(today: NaiveDate, months: u32) -> DateRange {
    let back = i64::from(months.saturating_sub(1));
    let from = shift_months(month_start(today), -back).unwrap_or(NaiveDate::MIN);
    DateRange::new(from, today)
}

/// Monthly equivalent of one fixed stream's latest amount
pub fn monthly_equivalent(stream: &Stream) -> f64 {
    let latest = stream.latest_snapshot().map_or(0.0, |s| s.usd_amount);
    let multiplier = stream.fixed_period.map_or(1.0, |p| p.monthly_multiplier());
    latest * multiplier
}

/// Compute forecast inputs from already-filtered streams
pub fn compute_inputs(streams: &[Stream], today: NaiveDate, config: &EngineConfig) -> ForecastInputs {
    let fixed_streams: Vec<FixedStreamContribution> = streams
        .iter()
        .filter(|s| s.is_fixed)
        .map(|s| FixedStreamContribution {
            stream_id: s.id,
            name: s.name.clone(),
            period: s.fixed_period,
            latest_usd: round_currency(s.latest_snapshot().map_or(0.0, |snap| snap.usd_amount)),
            monthly_equivalent: round_currency(monthly_equivalent(s)),
        })
        .collect();
    let fixed_monthly: f64 = streams
        .iter()
        .filter(|s| s.is_fixed)
        .map(monthly_equivalent)
        .sum();

    let window = lookback_window(today, config.forecast.lookback_months);
    let records = records_from_streams(streams.iter().filter(|s| !s.is_fixed), Some(window));
    // Streams arrive pre-filtered to one direction, so plain sums apply
    let direction = streams.first().map(|s| s.direction);
    let monthly_totals: Vec<f64> = group_records(&records, Granularity::Monthly, direction)
        .into_iter()
        .map(|b| b.amount)
        .collect();

    let variable_monthly = mean(&monthly_totals);
    let variable_std = std_dev(&monthly_totals);
    let growth_rate = dampened_growth_rate(&monthly_totals, &config.growth);

    let confidence = confidence_score(fixed_monthly, variable_monthly, variable_std, streams);

    ForecastInputs {
        fixed_monthly,
        variable_monthly,
        variable_std,
        growth_rate,
        confidence,
        history_months: monthly_totals.len(),
        fixed_streams,
    }
}

/// Confidence in `[0, 1]`
///
/// Half from the fixed share, 0.3 from variable stability, 0.2 from the
/// fraction of streams with enough history.
pub fn confidence_score(
    fixed_monthly: f64,
    variable_monthly: f64,
    variable_std: f64,
    streams: &[Stream],
) -> f64 {
    let total = fixed_monthly + variable_monthly;
    let fixed_ratio = if total > 0.0 { fixed_monthly / total } else { 0.0 };

    let penalty = if variable_monthly > 0.0 {
        variable_std / variable_monthly
    } else {
        0.0
    };

    let data_quality = if streams.is_empty() {
        0.0
    } else {
        let good = streams
            .iter()
            .filter(|s| s.snapshots.len() >= MIN_SNAPSHOTS_FOR_QUALITY)
            .count();
        good as f64 / streams.len() as f64
    };

    let score = 0.5 * fixed_ratio + 0.3 * (1.0 - penalty.min(1.0)) + 0.2 * data_quality;
    score.clamp(0.0, 1.0)
}

/// Raw (unrounded) projection for one horizon month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedMonth {
    pub month_index: u32,
    pub fixed: f64,
    pub variable: f64,
    pub projected: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Project month `i` (1-based) with confidence bands
pub fn project_month(inputs: &ForecastInputs, i: u32, config: &EngineConfig) -> ProjectedMonth {
    let g = inputs.growth_factor(i);
    let variable = inputs.variable_monthly * g;
    let widening = 1.0 + config.forecast.uncertainty_per_month * i as f64;
    let adjusted_std = inputs.variable_std * widening * g;
    let band = config.forecast.band_width * adjusted_std;

    ProjectedMonth {
        month_index: i,
        fixed: inputs.fixed_monthly,
        variable,
        projected: inputs.fixed_monthly + variable,
        lower: inputs.fixed_monthly + (variable - band).max(0.0),
        upper: inputs.fixed_monthly + variable + band,
    }
}

/// Projections for months `1..=months_ahead`, labelled from `today`
pub fn project(
    inputs: &ForecastInputs,
    months_ahead: u32,
    today: NaiveDate,
    config: &EngineConfig,
) -> Result<Vec<MonthlyProjection>> {
    let base = month_start(today);
    (1..=months_ahead)
        .map(|i| {
            let month = shift_months(base, i64::from(i)).ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "months_ahead {} runs past the supported calendar range",
                    months_ahead
                ))
            })?;
            let p = project_month(inputs, i, config);
            Ok(MonthlyProjection {
                month_index: i,
                month: month.format("%Y-%m").to_string(),
                fixed_usd: round_currency(p.fixed),
                variable_usd: round_currency(p.variable),
                projected_usd: round_currency(p.projected),
                lower_bound: round_currency(p.lower),
                upper_bound: round_currency(p.upper),
            })
        })
        .collect()
}

/// Sum of the next twelve growth-adjusted months
pub fn projected_annual(inputs: &ForecastInputs, config: &EngineConfig) -> f64 {
    (1..=12).map(|i| project_month(inputs, i, config).projected).sum()
}
