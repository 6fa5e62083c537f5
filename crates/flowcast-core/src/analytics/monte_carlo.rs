//! Monte Carlo simulation of cumulative outcomes
//!
//! Each path walks month by month: the fixed part gets a small multiplicative
//! noise, the variable part gets growth plus normally distributed volatility.
//! Both are floored at zero and the path stores its running total. Paths run
//! in batches with a cancellation check between batches.

use tracing::debug;

use super::cancel::CancelToken;
use super::forecast::ForecastInputs;
use super::rng::RandomSource;
use super::stats::{mean, percentile_sorted, round_currency, round_pct, sorted};
use super::types::{
    HistogramBucket, MonteCarloReport, MonthlyPercentiles, PercentileSet, SimulationInputs,
};
use crate::config::MonteCarloConfig;
use crate::error::{Error, Result};

pub const HISTOGRAM_BUCKETS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationRequest {
    pub simulations: usize,
    pub months_ahead: u32,
    pub goal: Option<f64>,
}

/// Raw simulated trajectories
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// `by_month[m][path]` is the cumulative total of `path` after month `m + 1`
    pub by_month: Vec<Vec<f64>>,
}

impl SimulationResult {
    /// Cumulative totals at the horizon
    pub fn finals(&self) -> &[f64] {
        self.by_month.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Volatility used for the variable part, never zero
pub fn effective_std(inputs: &ForecastInputs, config: &MonteCarloConfig) -> f64 {
    let floor = config.volatility_floor_ratio * inputs.baseline_monthly();
    let std = inputs.variable_std.max(floor);
    if std > 0.0 {
        std
    } else {
        config.min_volatility
    }
}

/// Run every path
pub fn simulate<R: RandomSource + ?Sized>(
    inputs: &ForecastInputs,
    request: &SimulationRequest,
    config: &MonteCarloConfig,
    rng: &mut R,
    cancel: &CancelToken,
) -> Result<SimulationResult> {
    if request.simulations == 0 {
        return Err(Error::InvalidParameter(
            "simulations must be at least 1".into(),
        ));
    }
    if request.months_ahead == 0 {
        return Err(Error::InvalidParameter(
            "months_ahead must be at least 1".into(),
        ));
    }

    let months = request.months_ahead as usize;
    let volatility = effective_std(inputs, config);
    let growth: Vec<f64> = (1..=request.months_ahead)
        .map(|m| inputs.growth_factor(m))
        .collect();

    let mut by_month: Vec<Vec<f64>> = (0..months)
        .map(|_| Vec::with_capacity(request.simulations))
        .collect();

    let batch_size = config.batch_size.max(1);
    let mut done = 0;
    while done < request.simulations {
        cancel.check()?;
        let batch = batch_size.min(request.simulations - done);

        for _ in 0..batch {
            let mut cumulative = 0.0;
            for (m, g) in growth.iter().enumerate() {
                let z_fixed = rng.next_standard_normal();
                let z_var = rng.next_standard_normal();

                let fixed = (inputs.fixed_monthly * (1.0 + config.fixed_noise * z_fixed)).max(0.0);
                let variable =
                    (inputs.variable_monthly * g + volatility * g * z_var).max(0.0);

                cumulative += fixed + variable;
                by_month[m].push(cumulative);
            }
        }

        done += batch;
    }

    debug!(
        simulations = request.simulations,
        months = months,
        volatility = volatility,
        "Monte Carlo paths complete"
    );

    Ok(SimulationResult { by_month })
}

/// P10/P25/P50/P75/P90 of sorted values
pub fn percentile_set(sorted_values: &[f64]) -> PercentileSet {
    PercentileSet {
        p10: round_currency(percentile_sorted(sorted_values, 0.10)),
        p25: round_currency(percentile_sorted(sorted_values, 0.25)),
        p50: round_currency(percentile_sorted(sorted_values, 0.50)),
        p75: round_currency(percentile_sorted(sorted_values, 0.75)),
        p90: round_currency(percentile_sorted(sorted_values, 0.90)),
    }
}

/// Equal-width histogram over `[min, max]`
///
/// The last bucket includes `max`. When every value is equal they all land
/// in the first bucket.
pub fn histogram(values: &[f64], buckets: usize) -> Vec<HistogramBucket> {
    if values.is_empty() || buckets == 0 {
        return vec![];
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / buckets as f64;

    let mut counts = vec![0usize; buckets];
    for v in values {
        let index = if width > 0.0 {
            (((v - min) / width).floor() as usize).min(buckets - 1)
        } else {
            0
        };
        counts[index] += 1;
    }

    let n = values.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBucket {
            lower: round_currency(min + width * i as f64),
            upper: round_currency(min + width * (i + 1) as f64),
            count,
            percentage: round_pct(count as f64 / n * 100.0),
        })
        .collect()
}

/// Fraction of values at or above the goal, as a percentage
pub fn goal_probability_pct(values: &[f64], goal: Option<f64>) -> f64 {
    match goal {
        Some(goal) if !values.is_empty() => {
            let hits = values.iter().filter(|v| **v >= goal).count();
            hits as f64 / values.len() as f64 * 100.0
        }
        _ => 0.0,
    }
}

/// Build the report payload from simulated paths
pub fn summarize(
    result: &SimulationResult,
    request: &SimulationRequest,
    inputs: &ForecastInputs,
    config: &MonteCarloConfig,
    seed: u64,
) -> MonteCarloReport {
    let finals = sorted(result.finals());

    let monthly_percentiles = result
        .by_month
        .iter()
        .enumerate()
        .map(|(m, values)| MonthlyPercentiles {
            month: m as u32 + 1,
            percentiles: percentile_set(&sorted(values)),
        })
        .collect();

    MonteCarloReport {
        simulations: request.simulations,
        months_ahead: request.months_ahead,
        seed,
        percentiles: percentile_set(&finals),
        mean_outcome: round_currency(mean(&finals)),
        goal_amount: request.goal,
        goal_probability_pct: round_pct(goal_probability_pct(&finals, request.goal)),
        distribution_buckets: histogram(&finals, HISTOGRAM_BUCKETS),
        monthly_percentiles,
        inputs_summary: SimulationInputs {
            fixed_monthly: round_currency(inputs.fixed_monthly),
            variable_monthly: round_currency(inputs.variable_monthly),
            variable_std_dev: round_currency(inputs.variable_std),
            effective_std_dev: round_currency(effective_std(inputs, config)),
            growth_rate_pct: round_pct(inputs.growth_rate * 100.0),
        },
    }
}
