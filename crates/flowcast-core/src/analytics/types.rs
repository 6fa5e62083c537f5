//! Report payloads
//!
//! Every amount here is already rounded for presentation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::periods::PeriodMode;
use super::stats::Movement;
use crate::models::{ComparisonType, DateRange, FixedPeriod, FlowDirection, Granularity, GroupBy};

/// Direction of an aggregate series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Upward,
    Downward,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upward => "upward",
            Self::Downward => "downward",
            Self::Stable => "stable",
        }
    }
}

impl From<Movement> for TrendDirection {
    fn from(m: Movement) -> Self {
        match m {
            Movement::Up => Self::Upward,
            Movement::Down => Self::Downward,
            Movement::Flat => Self::Stable,
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health of a single stream between two periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Growing,
    Declining,
    Stable,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Growing => "growing",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }
}

impl From<Movement> for HealthStatus {
    fn from(m: Movement) -> Self {
        match m {
            Movement::Up => Self::Growing,
            Movement::Down => Self::Declining,
            Movement::Flat => Self::Stable,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Daily Rate ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRateReport {
    pub direction: Option<FlowDirection>,
    pub avg_daily: f64,
    pub median_daily: f64,
    pub days_analyzed: i64,
    pub std_dev: f64,
    pub coefficient_of_variation: f64,
    pub total_usd: f64,
    pub date_range: DateRange,
}

// ========== Period Comparison ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_usd: f64,
    pub snapshot_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparisonReport {
    pub comparison: ComparisonType,
    pub mode: PeriodMode,
    pub current_period: PeriodSummary,
    pub previous_period: PeriodSummary,
    pub change_usd: f64,
    pub change_pct: f64,
    pub trend: TrendDirection,
}

// ========== Distribution ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionItem {
    pub key: String,
    pub amount_usd: f64,
    pub percentage: f64,
    pub snapshot_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionReport {
    pub group_by: GroupBy,
    pub items: Vec<DistributionItem>,
    pub total_usd: f64,
}

// ========== Top Performers ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    /// 1-based
    pub rank: usize,
    pub stream_id: i64,
    pub name: String,
    pub provider: Option<String>,
    pub category: String,
    pub direction: FlowDirection,
    pub total_usd: f64,
    pub percentage: f64,
    pub snapshot_count: usize,
    pub avg_per_snapshot: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformersReport {
    pub items: Vec<TopPerformer>,
    /// Total of the selected items
    pub total_usd: f64,
}

// ========== Trend ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub label: String,
    pub start: NaiveDate,
    pub amount_usd: f64,
    pub snapshot_count: usize,
    /// Change from the previous point (absent for the first)
    pub change_pct: Option<f64>,
}

/// One keyed series of a trend breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub key: String,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub granularity: Granularity,
    pub direction_filter: Option<FlowDirection>,
    pub points: Vec<TrendPoint>,
    /// First point to last point
    pub growth_rate_pct: f64,
    pub direction: TrendDirection,
    /// Mean of successive point-to-point changes
    pub avg_growth_per_period: f64,
    /// Dampened, recency-weighted growth per period
    pub weighted_growth_rate_pct: f64,
    pub breakdown: Option<GroupBy>,
    pub series: Vec<TrendSeries>,
}

// ========== Stream Health ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamHealth {
    pub stream_id: i64,
    pub name: String,
    pub direction: FlowDirection,
    pub current_usd: f64,
    pub previous_usd: f64,
    pub change_usd: f64,
    pub change_pct: f64,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCounts {
    pub growing: usize,
    pub declining: usize,
    pub stable: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamHealthReport {
    pub comparison: ComparisonType,
    pub mode: PeriodMode,
    pub current_start: NaiveDate,
    pub current_end: NaiveDate,
    pub previous_start: NaiveDate,
    pub previous_end: NaiveDate,
    pub per_stream: Vec<StreamHealth>,
    pub growing_count: usize,
    pub declining_count: usize,
    pub stable_count: usize,
}

impl StreamHealthReport {
    pub fn counts(&self) -> HealthCounts {
        HealthCounts {
            growing: self.growing_count,
            declining: self.declining_count,
            stable: self.stable_count,
        }
    }
}

// ========== Seasonality ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayStat {
    /// 0 = Sunday
    pub weekday: u32,
    pub name: String,
    pub avg_usd: f64,
    pub days: usize,
    pub deviation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthStat {
    /// 1 = January
    pub month: u32,
    pub name: String,
    pub avg_usd: f64,
    pub days: usize,
    pub deviation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityReport {
    pub date_range: DateRange,
    pub overall_daily_avg: f64,
    pub day_of_week_stats: Vec<WeekdayStat>,
    pub month_of_year_stats: Vec<MonthStat>,
    pub best_day: String,
    pub worst_day: String,
    pub best_month: String,
    pub worst_month: String,
}

// ========== Projection ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    /// 1-based month offset from now
    pub month_index: u32,
    /// `YYYY-MM`
    pub month: String,
    pub fixed_usd: f64,
    pub variable_usd: f64,
    pub projected_usd: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedStreamContribution {
    pub stream_id: i64,
    pub name: String,
    pub period: Option<FixedPeriod>,
    pub latest_usd: f64,
    pub monthly_equivalent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub direction: FlowDirection,
    pub months_ahead: u32,
    pub fixed_monthly: f64,
    pub variable_monthly: f64,
    pub variable_std_dev: f64,
    pub growth_rate_pct: f64,
    /// Current monthly run rate (fixed + variable)
    pub projected_monthly: f64,
    /// Twelve growth-adjusted months
    pub projected_annual: f64,
    pub confidence_score: f64,
    pub monthly_projections: Vec<MonthlyProjection>,
    pub fixed_streams: Vec<FixedStreamContribution>,
}

// ========== Monte Carlo ==========

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileSet {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPercentiles {
    /// 1-based
    pub month: u32,
    #[serde(flatten)]
    pub percentiles: PercentileSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    pub fixed_monthly: f64,
    pub variable_monthly: f64,
    pub variable_std_dev: f64,
    pub effective_std_dev: f64,
    pub growth_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloReport {
    pub simulations: usize,
    pub months_ahead: u32,
    pub seed: u64,
    pub percentiles: PercentileSet,
    pub mean_outcome: f64,
    pub goal_amount: Option<f64>,
    pub goal_probability_pct: f64,
    pub distribution_buckets: Vec<HistogramBucket>,
    pub monthly_percentiles: Vec<MonthlyPercentiles>,
    pub inputs_summary: SimulationInputs,
}

// ========== Overview ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub as_of: NaiveDate,
    pub daily_rate: DailyRateReport,
    pub comparison: PeriodComparisonReport,
    pub top_performers: TopPerformersReport,
    pub health: HealthCounts,
    pub projection: ProjectionReport,
}
