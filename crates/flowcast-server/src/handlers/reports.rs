//! Report handlers
//!
//! Query values for granularity, grouping, and comparison type are parsed
//! leniently: an unknown value falls back to the documented default.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use flowcast_core::analytics::{
    DailyRateReport, DistributionReport, MonteCarloReport, Overview, PeriodComparisonReport,
    ProjectionReport, SeasonalityReport, StreamHealthReport, TopPerformersReport, TrendReport,
};
use flowcast_core::models::{
    parse_day, ComparisonType, DateRange, Granularity, GroupBy, StreamFilter,
};
use flowcast_core::{MonteCarloParams, TrendParams};

use super::{run_engine, FilterQuery};
use crate::{AppError, AppState};

const DEFAULT_DAYS_BACK: u32 = 30;
const DEFAULT_MONTHS: u32 = 12;
const DEFAULT_PERIODS_BACK: u32 = 12;
const DEFAULT_TOP_N: usize = 10;

/// GET /api/overview - Dashboard summary
pub async fn overview(State(state): State<Arc<AppState>>) -> Result<Json<Overview>, AppError> {
    let overview = run_engine(state, |engine| engine.overview()).await?;
    Ok(Json(overview))
}

#[derive(Debug, Deserialize)]
pub struct DailyRateQuery {
    /// Window length in days, ending today
    pub days: Option<u32>,
}

/// GET /api/reports/daily-rate
pub async fn daily_rate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DailyRateQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<DailyRateReport>, AppError> {
    let filter = filter.into_filter()?;
    let days = params.days.unwrap_or(DEFAULT_DAYS_BACK);

    let report = run_engine(state, move |engine| engine.daily_rate(days, &filter)).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct ComparisonQuery {
    /// mom, wow, qoq, yoy
    pub comparison: Option<String>,
    /// Reference date (YYYY-MM-DD); switches to complete periods
    pub reference: Option<String>,
}

impl ComparisonQuery {
    fn comparison(&self) -> ComparisonType {
        self.comparison
            .as_deref()
            .map(ComparisonType::parse_lenient)
            .unwrap_or(ComparisonType::MoM)
    }
}

/// GET /api/reports/comparison
pub async fn comparison(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ComparisonQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<PeriodComparisonReport>, AppError> {
    let filter = filter.into_filter()?;
    let comparison = params.comparison();
    let reference = params
        .reference
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_day)
        .transpose()?;

    let report = run_engine(state, move |engine| {
        engine.period_comparison(comparison, reference, &filter)
    })
    .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct DistributionQuery {
    /// category, provider, stream, currency
    pub group_by: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/reports/distribution
pub async fn distribution(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DistributionQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<DistributionReport>, AppError> {
    let filter = filter.into_filter()?;
    let group_by = params
        .group_by
        .as_deref()
        .map(GroupBy::parse_lenient)
        .unwrap_or(GroupBy::Category);

    let report = run_engine(state, move |engine| {
        let range = DateRange::from_bounds(
            params.from.as_deref(),
            params.to.as_deref(),
            engine.today(),
        )?;
        engine.distribution(group_by, range, &filter)
    })
    .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct TopPerformersQuery {
    pub limit: Option<usize>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/reports/top-performers
pub async fn top_performers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopPerformersQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<TopPerformersReport>, AppError> {
    let direction = filter.direction()?;
    let limit = params.limit.unwrap_or(DEFAULT_TOP_N);

    let report = run_engine(state, move |engine| {
        let range = DateRange::from_bounds(
            params.from.as_deref(),
            params.to.as_deref(),
            engine.today(),
        )?;
        engine.top_performers(limit, range, direction)
    })
    .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    /// daily, weekly, monthly, quarterly, yearly
    pub granularity: Option<String>,
    /// Number of buckets ending with the current one
    pub periods: Option<u32>,
    /// Optional per-key series: category, provider, stream, currency
    pub breakdown: Option<String>,
}

/// GET /api/reports/trend
pub async fn trend(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<TrendReport>, AppError> {
    let granularity = params
        .granularity
        .as_deref()
        .map(Granularity::parse_lenient)
        .unwrap_or(Granularity::Monthly);
    let mut trend = TrendParams::new(
        granularity,
        params.periods.unwrap_or(DEFAULT_PERIODS_BACK),
    );
    trend.filter = filter.into_filter()?;
    trend.breakdown = params
        .breakdown
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(GroupBy::parse_lenient);

    let report = run_engine(state, move |engine| engine.trend(&trend)).await?;
    Ok(Json(report))
}

/// GET /api/reports/stream-health
pub async fn stream_health(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ComparisonQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<StreamHealthReport>, AppError> {
    let filter = filter.into_filter()?;
    let comparison = params.comparison();

    let report = run_engine(state, move |engine| engine.stream_trends(comparison, &filter)).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct MonthsQuery {
    pub months: Option<u32>,
}

/// GET /api/reports/seasonality
pub async fn seasonality(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthsQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<SeasonalityReport>, AppError> {
    let filter = filter.into_filter()?;
    let months = params.months.unwrap_or(DEFAULT_MONTHS);

    let report = run_engine(state, move |engine| engine.seasonality(months, &filter)).await?;
    Ok(Json(report))
}

/// GET /api/reports/projection
pub async fn projection(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthsQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<ProjectionReport>, AppError> {
    let filter = filter.into_filter()?;
    let months = params.months.unwrap_or(DEFAULT_MONTHS);

    let report = run_engine(state, move |engine| engine.projection(months, &filter)).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct MonteCarloQuery {
    pub simulations: Option<usize>,
    pub months: Option<u32>,
    pub goal: Option<f64>,
    pub seed: Option<u64>,
}

/// GET /api/reports/monte-carlo
pub async fn monte_carlo(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonteCarloQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<MonteCarloReport>, AppError> {
    let filter: StreamFilter = filter.into_filter()?;
    let simulation = MonteCarloParams {
        simulations: params.simulations,
        months_ahead: params.months.unwrap_or(DEFAULT_MONTHS),
        goal: params.goal,
        seed: params.seed,
        filter,
    };

    let report = run_engine(state, move |engine| engine.monte_carlo(&simulation)).await?;
    Ok(Json(report))
}
