//! Analytics facade
//!
//! [`AnalyticsEngine`] fetches streams through a [`StreamSource`], applies the
//! request filters, and hands the data to the stateless components. Each
//! report method is a pure function of the fetched data, the config, and
//! "today".

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use super::aggregators;
use super::cancel::CancelToken;
use super::forecast::{self, lookback_window, ForecastInputs};
use super::grouping::{
    bucket_start_back, daily_series, group_records, group_stacked, records_from_streams,
    FlowRecord,
};
use super::monte_carlo::{self, SimulationRequest};
use super::periods::{days_before, resolve_periods};
use super::rng::SeededRandom;
use super::stats::{
    change_percentage, classify_change, coefficient_of_variation, mean, median, round_currency,
    round_pct, std_dev,
};
use super::types::{
    DailyRateReport, DistributionReport, MonteCarloReport, Overview, PeriodComparisonReport,
    PeriodSummary, ProjectionReport, SeasonalityReport, StreamHealthReport, TopPerformersReport,
    TrendDirection, TrendReport, TrendSeries,
};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::{
    ComparisonType, DateRange, FlowDirection, Granularity, GroupBy, Provider, Snapshot, Stream,
    StreamFilter,
};
use crate::source::StreamSource;

const OVERVIEW_DAILY_RATE_DAYS: u32 = 30;
const OVERVIEW_TOP_N: usize = 5;
const OVERVIEW_PROJECTION_MONTHS: u32 = 6;

/// Parameters for a trend report
#[derive(Debug, Clone, PartialEq)]
pub struct TrendParams {
    pub granularity: Granularity,
    /// Number of buckets back from (and including) the current one
    pub periods_back: u32,
    pub filter: StreamFilter,
    /// Also emit one series per key
    pub breakdown: Option<GroupBy>,
}

impl TrendParams {
    pub fn new(granularity: Granularity, periods_back: u32) -> Self {
        Self {
            granularity,
            periods_back,
            filter: StreamFilter::default(),
            breakdown: None,
        }
    }
}

/// Parameters for a Monte Carlo run
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloParams {
    /// Defaults to the configured simulation count
    pub simulations: Option<usize>,
    pub months_ahead: u32,
    pub goal: Option<f64>,
    /// Seed for reproducible runs; clock-seeded when absent
    pub seed: Option<u64>,
    pub filter: StreamFilter,
}

impl MonteCarloParams {
    pub fn new(months_ahead: u32) -> Self {
        Self {
            simulations: None,
            months_ahead,
            goal: None,
            seed: None,
            filter: StreamFilter::default(),
        }
    }
}

/// Sum of the records (plain under a direction filter, else net flow)
fn flow_total(records: &[FlowRecord], filter: Option<FlowDirection>) -> (f64, usize) {
    records.iter().fold((0.0, 0), |(sum, n), r| match filter {
        Some(d) if d != r.direction => (sum, n),
        Some(_) => (sum + r.usd_amount, n + 1),
        None => match r.direction {
            FlowDirection::Income => (sum + r.usd_amount, n + 1),
            FlowDirection::Outcome => (sum - r.usd_amount, n + 1),
        },
    })
}

/// Reject zero and anything above the configured limit
fn require_in_range(name: &str, value: u32, max: u32) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidParameter(format!("{} must be at least 1", name)));
    }
    if value > max {
        return Err(Error::InvalidParameter(format!(
            "{} must be at most {}",
            name, max
        )));
    }
    Ok(())
}

fn calendar_overflow(name: &str, value: u32) -> Error {
    Error::InvalidParameter(format!(
        "{} {} reaches past the supported calendar range",
        name, value
    ))
}

/// Report facade over a stream source
pub struct AnalyticsEngine<S: StreamSource> {
    source: S,
    config: EngineConfig,
    today: Option<NaiveDate>,
    cancel: CancelToken,
}

impl<S: StreamSource> AnalyticsEngine<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    pub fn with_config(source: S, config: EngineConfig) -> Self {
        Self {
            source,
            config,
            today: None,
            cancel: CancelToken::new(),
        }
    }

    /// Pin "today" (reports are otherwise relative to the local date)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Fetch streams and apply the filters the source does not handle
    fn load(&self, filter: &StreamFilter) -> Result<Vec<Stream>> {
        self.cancel.check()?;
        let mut streams = self.source.fetch_streams(&filter.source_query())?;
        self.cancel.check()?;
        streams.retain(|s| filter.matches(s));
        Ok(streams)
    }

    fn providers(&self) -> Result<Vec<Provider>> {
        self.source.fetch_providers()
    }

    // ========== Reports ==========

    /// Average, median, and spread of daily totals over the last `days_back` days
    pub fn daily_rate(&self, days_back: u32, filter: &StreamFilter) -> Result<DailyRateReport> {
        require_in_range("days_back", days_back, self.config.limits.max_days_back)?;

        let today = self.today();
        let from = days_before(today, i64::from(days_back) - 1)
            .ok_or_else(|| calendar_overflow("days_back", days_back))?;
        let range = DateRange::new(from, today);
        let streams = self.load(filter)?;
        let records = records_from_streams(&streams, Some(range));

        let daily: Vec<f64> = daily_series(&records, range, filter.direction)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let total: f64 = daily.iter().sum();

        debug!(
            days = daily.len(),
            records = records.len(),
            "Computed daily rate"
        );

        Ok(DailyRateReport {
            direction: filter.direction,
            avg_daily: round_currency(mean(&daily)),
            median_daily: round_currency(median(&daily)),
            days_analyzed: range.days(),
            std_dev: round_currency(std_dev(&daily)),
            coefficient_of_variation: round_pct(coefficient_of_variation(&daily)),
            total_usd: round_currency(total),
            date_range: range,
        })
    }

    /// Current vs previous period totals
    pub fn period_comparison(
        &self,
        comparison: ComparisonType,
        reference: Option<NaiveDate>,
        filter: &StreamFilter,
    ) -> Result<PeriodComparisonReport> {
        let bounds = resolve_periods(comparison, reference, self.today())?;
        let streams = self.load(filter)?;

        let current = records_from_streams(&streams, Some(bounds.current()));
        let previous = records_from_streams(&streams, Some(bounds.previous()));
        let (current_total, current_count) = flow_total(&current, filter.direction);
        let (previous_total, previous_count) = flow_total(&previous, filter.direction);

        let change_pct = change_percentage(previous_total, current_total);

        debug!(
            comparison = %comparison,
            mode = ?bounds.mode,
            current = current_total,
            previous = previous_total,
            "Computed period comparison"
        );

        Ok(PeriodComparisonReport {
            comparison,
            mode: bounds.mode,
            current_period: PeriodSummary {
                start: bounds.current_start,
                end: bounds.current_end,
                total_usd: round_currency(current_total),
                snapshot_count: current_count,
            },
            previous_period: PeriodSummary {
                start: bounds.previous_start,
                end: bounds.previous_end,
                total_usd: round_currency(previous_total),
                snapshot_count: previous_count,
            },
            change_usd: round_currency(current_total - previous_total),
            change_pct: round_pct(change_pct),
            trend: TrendDirection::from(classify_change(
                change_pct,
                self.config.trend_threshold_pct,
            )),
        })
    }

    /// Share of the total per category, provider, stream, or currency
    pub fn distribution(
        &self,
        group_by: GroupBy,
        range: Option<DateRange>,
        filter: &StreamFilter,
    ) -> Result<DistributionReport> {
        let streams = self.load(filter)?;
        let providers = match group_by {
            GroupBy::Provider => self.providers()?,
            _ => vec![],
        };
        let report = aggregators::distribution(&streams, &providers, group_by, range);
        debug!(group_by = %group_by, items = report.items.len(), "Computed distribution");
        Ok(report)
    }

    /// Streams ranked by total
    pub fn top_performers(
        &self,
        top_n: usize,
        range: Option<DateRange>,
        direction: Option<FlowDirection>,
    ) -> Result<TopPerformersReport> {
        if top_n == 0 {
            return Err(Error::InvalidParameter("top_n must be at least 1".into()));
        }
        let filter = StreamFilter {
            direction,
            ..Default::default()
        };
        let streams = self.load(&filter)?;
        let providers = self.providers()?;
        let report = aggregators::top_performers(&streams, &providers, top_n, range);
        debug!(top_n, items = report.items.len(), "Computed top performers");
        Ok(report)
    }

    /// Bucketed series over the last `periods_back` buckets
    pub fn trend(&self, params: &TrendParams) -> Result<TrendReport> {
        require_in_range(
            "periods_back",
            params.periods_back,
            self.config.limits.max_periods_back,
        )?;

        let today = self.today();
        let granularity = params.granularity;
        let from = bucket_start_back(today, granularity, params.periods_back - 1)
            .ok_or_else(|| calendar_overflow("periods_back", params.periods_back))?;
        let range = DateRange::new(from, today);

        let streams = self.load(&params.filter)?;
        let records = records_from_streams(&streams, Some(range));
        let buckets = group_records(&records, granularity, params.filter.direction);
        self.cancel.check()?;

        let summary = aggregators::summarize_trend(
            &buckets,
            &self.config.growth,
            self.config.trend_threshold_pct,
        );

        let series = match params.breakdown {
            Some(group_by) => self.breakdown_series(
                &streams,
                group_by,
                range,
                granularity,
                params.filter.direction,
            )?,
            None => vec![],
        };

        debug!(
            granularity = %granularity,
            points = buckets.len(),
            series = series.len(),
            "Computed trend"
        );

        Ok(TrendReport {
            granularity,
            direction_filter: params.filter.direction,
            points: aggregators::trend_points(&buckets, granularity),
            growth_rate_pct: summary.growth_rate_pct,
            direction: summary.direction,
            avg_growth_per_period: summary.avg_growth_per_period,
            weighted_growth_rate_pct: summary.weighted_growth_rate_pct,
            breakdown: params.breakdown,
            series,
        })
    }

    fn breakdown_series(
        &self,
        streams: &[Stream],
        group_by: GroupBy,
        range: DateRange,
        granularity: Granularity,
        direction: Option<FlowDirection>,
    ) -> Result<Vec<TrendSeries>> {
        let providers = match group_by {
            GroupBy::Provider => self.providers()?,
            _ => vec![],
        };
        let provider_name = |id: Option<i64>| -> String {
            id.and_then(|id| providers.iter().find(|p| p.id == id))
                .map_or_else(|| "Unknown".to_string(), |p| p.name.clone())
        };

        let items: Vec<(&Stream, &Snapshot)> = streams
            .iter()
            .flat_map(|s| s.snapshots.iter().map(move |snap| (s, snap)))
            .filter(|(_, snap)| range.contains(snap.date))
            .collect();

        let series = group_stacked(
            &items,
            granularity,
            direction,
            |(stream, snap)| FlowRecord {
                date: snap.date,
                usd_amount: snap.usd_amount,
                direction: stream.direction,
            },
            |(stream, snap)| match group_by {
                GroupBy::Category => stream.category_label().to_string(),
                GroupBy::Provider => provider_name(stream.provider_id),
                GroupBy::Stream => stream.name.clone(),
                GroupBy::Currency => snap.currency.to_uppercase(),
            },
        );

        Ok(series
            .into_iter()
            .map(|s| TrendSeries {
                points: aggregators::trend_points(&s.buckets, granularity),
                key: s.key,
            })
            .collect())
    }

    /// Per-stream growth between the resolved comparison windows
    pub fn stream_trends(
        &self,
        comparison: ComparisonType,
        filter: &StreamFilter,
    ) -> Result<StreamHealthReport> {
        let bounds = resolve_periods(comparison, None, self.today())?;
        let streams = self.load(filter)?;
        let report =
            aggregators::stream_health(&streams, &bounds, self.config.trend_threshold_pct);
        debug!(
            streams = report.per_stream.len(),
            growing = report.growing_count,
            declining = report.declining_count,
            "Computed stream health"
        );
        Ok(report)
    }

    /// Weekday and month-of-year patterns over the last `months_back` months
    pub fn seasonality(&self, months_back: u32, filter: &StreamFilter) -> Result<SeasonalityReport> {
        require_in_range("months_back", months_back, self.config.limits.max_months_back)?;
        let range = lookback_window(self.today(), months_back);
        let streams = self.load(filter)?;
        let records = records_from_streams(&streams, Some(range));
        self.cancel.check()?;
        let report = aggregators::seasonality(&records, range, filter.direction);
        debug!(
            records = records.len(),
            months = report.month_of_year_stats.len(),
            "Computed seasonality"
        );
        Ok(report)
    }

    /// Direction the projection covers (income unless asked otherwise)
    fn projection_filter(filter: &StreamFilter) -> StreamFilter {
        StreamFilter {
            direction: Some(filter.direction.unwrap_or(FlowDirection::Income)),
            ..filter.clone()
        }
    }

    fn forecast_inputs(&self, filter: &StreamFilter) -> Result<ForecastInputs> {
        let streams = self.load(filter)?;
        let inputs = forecast::compute_inputs(&streams, self.today(), &self.config);
        debug!(
            streams = streams.len(),
            fixed = inputs.fixed_monthly,
            variable = inputs.variable_monthly,
            growth = inputs.growth_rate,
            "Computed forecast inputs"
        );
        Ok(inputs)
    }

    /// Month-by-month projection with confidence bands
    pub fn projection(&self, months_ahead: u32, filter: &StreamFilter) -> Result<ProjectionReport> {
        require_in_range("months_ahead", months_ahead, self.config.limits.max_months_ahead)?;
        let filter = Self::projection_filter(filter);
        let inputs = self.forecast_inputs(&filter)?;
        let monthly_projections =
            forecast::project(&inputs, months_ahead, self.today(), &self.config)?;

        Ok(ProjectionReport {
            direction: filter.direction.unwrap_or(FlowDirection::Income),
            months_ahead,
            fixed_monthly: round_currency(inputs.fixed_monthly),
            variable_monthly: round_currency(inputs.variable_monthly),
            variable_std_dev: round_currency(inputs.variable_std),
            growth_rate_pct: round_pct(inputs.growth_rate * 100.0),
            projected_monthly: round_currency(inputs.baseline_monthly()),
            projected_annual: round_currency(forecast::projected_annual(&inputs, &self.config)),
            confidence_score: round_pct(inputs.confidence),
            monthly_projections,
            fixed_streams: inputs.fixed_streams,
        })
    }

    /// Probabilistic projection of cumulative totals
    pub fn monte_carlo(&self, params: &MonteCarloParams) -> Result<MonteCarloReport> {
        require_in_range(
            "months_ahead",
            params.months_ahead,
            self.config.limits.max_months_ahead,
        )?;

        let mc = &self.config.monte_carlo;
        let mut simulations = params.simulations.unwrap_or(mc.default_simulations);
        if simulations == 0 {
            return Err(Error::InvalidParameter(
                "simulations must be at least 1".into(),
            ));
        }
        if simulations > mc.max_simulations {
            warn!(
                requested = simulations,
                max = mc.max_simulations,
                "Clamping simulation count"
            );
            simulations = mc.max_simulations;
        }

        let filter = Self::projection_filter(&params.filter);
        let inputs = self.forecast_inputs(&filter)?;

        let mut rng = match params.seed {
            Some(seed) => SeededRandom::from_seed(seed),
            None => SeededRandom::from_clock(),
        };
        let request = SimulationRequest {
            simulations,
            months_ahead: params.months_ahead,
            goal: params.goal,
        };

        let result = monte_carlo::simulate(&inputs, &request, mc, &mut rng, &self.cancel)?;
        Ok(monte_carlo::summarize(&result, &request, &inputs, mc, rng.seed()))
    }

    /// Dashboard composition of the headline reports
    pub fn overview(&self) -> Result<Overview> {
        let all = StreamFilter::default();
        let health = self.stream_trends(ComparisonType::MoM, &all)?;

        Ok(Overview {
            as_of: self.today(),
            daily_rate: self.daily_rate(OVERVIEW_DAILY_RATE_DAYS, &all)?,
            comparison: self.period_comparison(ComparisonType::MoM, None, &all)?,
            top_performers: self.top_performers(OVERVIEW_TOP_N, None, None)?,
            health: health.counts(),
            projection: self.projection(OVERVIEW_PROJECTION_MONTHS, &all)?,
        })
    }
}
