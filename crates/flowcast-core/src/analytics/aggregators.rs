//! Cross-sectional aggregators
//!
//! Pure functions over already-filtered streams: distribution by key, top
//! performers, per-stream health between two windows, trend summaries, and
//! day-of-week / month-of-year seasonality.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use super::grouping::{bucket_label, group_records, Bucket, FlowRecord};
use super::periods::PeriodBounds;
use super::stats::{
    change_percentage, classify_change, dampened_growth_rate, mean, round_currency, round_pct,
};
use super::types::{
    DistributionItem, DistributionReport, HealthStatus, MonthStat, SeasonalityReport, StreamHealth,
    StreamHealthReport, TopPerformer, TopPerformersReport, TrendDirection, TrendPoint, WeekdayStat,
};
use crate::config::GrowthConfig;
use crate::models::{DateRange, FlowDirection, Granularity, GroupBy, Provider, Snapshot, Stream};

const NOT_AVAILABLE: &str = "N/A";
const UNKNOWN_PROVIDER: &str = "Unknown";

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

fn provider_names(providers: &[Provider]) -> HashMap<i64, &str> {
    providers.iter().map(|p| (p.id, p.name.as_str())).collect()
}

fn in_window<'a>(stream: &'a Stream, range: Option<DateRange>) -> impl Iterator<Item = &'a Snapshot> {
    stream
        .snapshots
        .iter()
        .filter(move |s| range.map_or(true, |r| r.contains(s.date)))
}

// ========== Distribution ==========

/// Share of the total per grouping key
///
/// No items are reported unless the total is positive.
pub fn distribution(
    streams: &[Stream],
    providers: &[Provider],
    group_by: GroupBy,
    range: Option<DateRange>,
) -> DistributionReport {
    let names = provider_names(providers);
    let mut groups: HashMap<String, (f64, usize)> = HashMap::new();

    for stream in streams {
        for snapshot in in_window(stream, range) {
            let key = match group_by {
                GroupBy::Category => stream.category_label().to_string(),
                GroupBy::Provider => stream
                    .provider_id
                    .and_then(|id| names.get(&id).copied())
                    .unwrap_or(UNKNOWN_PROVIDER)
                    .to_string(),
                GroupBy::Stream => stream.name.clone(),
                GroupBy::Currency => snapshot.currency.to_uppercase(),
            };
            let entry = groups.entry(key).or_insert((0.0, 0));
            entry.0 += snapshot.usd_amount;
            entry.1 += 1;
        }
    }

    let total: f64 = groups.values().map(|(amount, _)| amount).sum();
    if total <= 0.0 {
        return DistributionReport {
            group_by,
            items: vec![],
            total_usd: round_currency(total),
        };
    }

    let mut items: Vec<(String, f64, usize)> = groups
        .into_iter()
        .map(|(key, (amount, count))| (key, amount, count))
        .collect();
    items.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    DistributionReport {
        group_by,
        items: items
            .into_iter()
            .map(|(key, amount, count)| DistributionItem {
                key,
                amount_usd: round_currency(amount),
                percentage: round_pct(amount / total * 100.0),
                snapshot_count: count,
            })
            .collect(),
        total_usd: round_currency(total),
    }
}

// ========== Top Performers ==========

/// Streams ranked by total inside the window
pub fn top_performers(
    streams: &[Stream],
    providers: &[Provider],
    top_n: usize,
    range: Option<DateRange>,
) -> TopPerformersReport {
    let names = provider_names(providers);

    let mut totals: Vec<(&Stream, f64, usize)> = streams
        .iter()
        .map(|s| {
            let (sum, count) = in_window(s, range)
                .fold((0.0, 0usize), |(sum, n), snap| (sum + snap.usd_amount, n + 1));
            (s, sum, count)
        })
        .filter(|(_, _, count)| *count > 0)
        .collect();

    totals.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
    totals.truncate(top_n);

    let selected_total: f64 = totals.iter().map(|(_, sum, _)| sum).sum();

    let items = totals
        .into_iter()
        .enumerate()
        .map(|(i, (stream, sum, count))| TopPerformer {
            rank: i + 1,
            stream_id: stream.id,
            name: stream.name.clone(),
            provider: stream
                .provider_id
                .and_then(|id| names.get(&id))
                .map(|n| n.to_string()),
            category: stream.category_label().to_string(),
            direction: stream.direction,
            total_usd: round_currency(sum),
            percentage: if selected_total > 0.0 {
                round_pct(sum / selected_total * 100.0)
            } else {
                0.0
            },
            snapshot_count: count,
            avg_per_snapshot: round_currency(sum / count as f64),
        })
        .collect();

    TopPerformersReport {
        items,
        total_usd: round_currency(selected_total),
    }
}

// ========== Stream Health ==========

fn window_total(stream: &Stream, range: DateRange) -> f64 {
    in_window(stream, Some(range)).map(|s| s.usd_amount).sum()
}

/// Per-stream change between the resolved windows
pub fn stream_health(streams: &[Stream], bounds: &PeriodBounds, threshold_pct: f64) -> StreamHealthReport {
    let mut per_stream: Vec<StreamHealth> = streams
        .iter()
        .map(|stream| {
            let current = window_total(stream, bounds.current());
            let previous = window_total(stream, bounds.previous());
            let change_pct = change_percentage(previous, current);
            StreamHealth {
                stream_id: stream.id,
                name: stream.name.clone(),
                direction: stream.direction,
                current_usd: round_currency(current),
                previous_usd: round_currency(previous),
                change_usd: round_currency(current - previous),
                change_pct: round_pct(change_pct),
                status: HealthStatus::from(classify_change(change_pct, threshold_pct)),
            }
        })
        .collect();

    per_stream.sort_by(|a, b| {
        b.change_pct
            .total_cmp(&a.change_pct)
            .then_with(|| a.stream_id.cmp(&b.stream_id))
    });

    let count = |status: HealthStatus| per_stream.iter().filter(|s| s.status == status).count();
    let growing_count = count(HealthStatus::Growing);
    let declining_count = count(HealthStatus::Declining);
    let stable_count = count(HealthStatus::Stable);

    StreamHealthReport {
        comparison: bounds.comparison,
        mode: bounds.mode,
        current_start: bounds.current_start,
        current_end: bounds.current_end,
        previous_start: bounds.previous_start,
        previous_end: bounds.previous_end,
        per_stream,
        growing_count,
        declining_count,
        stable_count,
    }
}

// ========== Trend ==========

/// Convert buckets into labelled points with point-to-point change
pub fn trend_points(buckets: &[Bucket], granularity: Granularity) -> Vec<TrendPoint> {
    buckets
        .iter()
        .enumerate()
        .map(|(i, b)| TrendPoint {
            label: bucket_label(b.key, granularity),
            start: b.key,
            amount_usd: round_currency(b.amount),
            snapshot_count: b.count,
            change_pct: (i > 0).then(|| round_pct(change_percentage(buckets[i - 1].amount, b.amount))),
        })
        .collect()
}

/// Summary statistics of a bucket series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSummary {
    pub growth_rate_pct: f64,
    pub direction: TrendDirection,
    pub avg_growth_per_period: f64,
    pub weighted_growth_rate_pct: f64,
}

/// First-to-last growth, mean step growth, and dampened weighted growth
///
/// Fewer than two buckets yields a flat, zero-growth summary.
pub fn summarize_trend(buckets: &[Bucket], growth: &GrowthConfig, threshold_pct: f64) -> TrendSummary {
    if buckets.len() < 2 {
        return TrendSummary {
            growth_rate_pct: 0.0,
            direction: TrendDirection::Stable,
            avg_growth_per_period: 0.0,
            weighted_growth_rate_pct: 0.0,
        };
    }

    let amounts: Vec<f64> = buckets.iter().map(|b| b.amount).collect();
    let first = amounts[0];
    let last = amounts[amounts.len() - 1];
    let growth_rate_pct = change_percentage(first, last);

    let steps: Vec<f64> = amounts
        .windows(2)
        .map(|w| change_percentage(w[0], w[1]))
        .collect();

    TrendSummary {
        growth_rate_pct: round_pct(growth_rate_pct),
        direction: TrendDirection::from(classify_change(growth_rate_pct, threshold_pct)),
        avg_growth_per_period: round_pct(mean(&steps)),
        weighted_growth_rate_pct: round_pct(dampened_growth_rate(&amounts, growth) * 100.0),
    }
}

// ========== Seasonality ==========

fn deviation_pct(avg: f64, overall: f64) -> f64 {
    if overall == 0.0 {
        0.0
    } else {
        (avg - overall) / overall.abs() * 100.0
    }
}

/// Name of the highest and lowest mean among entries that have data
fn extremes<'a>(entries: impl Iterator<Item = (&'a str, f64)>) -> (String, String) {
    let mut best: Option<(&str, f64)> = None;
    let mut worst: Option<(&str, f64)> = None;
    for (name, avg) in entries {
        if best.map_or(true, |(_, b)| avg > b) {
            best = Some((name, avg));
        }
        if worst.map_or(true, |(_, w)| avg < w) {
            worst = Some((name, avg));
        }
    }
    let name = |e: Option<(&str, f64)>| e.map_or(NOT_AVAILABLE, |(n, _)| n).to_string();
    (name(best), name(worst))
}

/// Day-of-week and month-of-year patterns of daily totals
///
/// Only days with activity form the daily series. All seven weekdays are
/// always reported; months appear only when they have data.
pub fn seasonality(
    records: &[FlowRecord],
    range: DateRange,
    filter: Option<FlowDirection>,
) -> SeasonalityReport {
    let in_range: Vec<FlowRecord> = records
        .iter()
        .copied()
        .filter(|r| range.contains(r.date))
        .collect();
    let daily: Vec<(NaiveDate, f64)> = group_records(&in_range, Granularity::Daily, filter)
        .into_iter()
        .map(|b| (b.key, b.amount))
        .collect();

    let overall = mean(&daily.iter().map(|(_, v)| *v).collect::<Vec<_>>());

    let mut by_weekday: [Vec<f64>; 7] = Default::default();
    let mut by_month: [Vec<f64>; 12] = Default::default();
    for (date, amount) in &daily {
        by_weekday[date.weekday().num_days_from_sunday() as usize].push(*amount);
        by_month[date.month0() as usize].push(*amount);
    }

    let day_of_week_stats: Vec<WeekdayStat> = by_weekday
        .iter()
        .enumerate()
        .map(|(i, values)| {
            let avg = mean(values);
            WeekdayStat {
                weekday: i as u32,
                name: WEEKDAY_NAMES[i].to_string(),
                avg_usd: round_currency(avg),
                days: values.len(),
                deviation_pct: if values.is_empty() {
                    0.0
                } else {
                    round_pct(deviation_pct(avg, overall))
                },
            }
        })
        .collect();

    let month_of_year_stats: Vec<MonthStat> = by_month
        .iter()
        .enumerate()
        .filter(|(_, values)| !values.is_empty())
        .map(|(i, values)| {
            let avg = mean(values);
            MonthStat {
                month: i as u32 + 1,
                name: MONTH_NAMES[i].to_string(),
                avg_usd: round_currency(avg),
                days: values.len(),
                deviation_pct: round_pct(deviation_pct(avg, overall)),
            }
        })
        .collect();

    let (best_day, worst_day) = extremes(
        by_weekday
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_empty())
            .map(|(i, v)| (WEEKDAY_NAMES[i], mean(v))),
    );
    let (best_month, worst_month) = extremes(
        by_month
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_empty())
            .map(|(i, v)| (MONTH_NAMES[i], mean(v))),
    );

    SeasonalityReport {
        date_range: range,
        overall_daily_avg: round_currency(overall),
        day_of_week_stats,
        month_of_year_stats,
        best_day,
        worst_day,
        best_month,
        worst_month,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::periods::resolve_complete;
    use crate::analytics::grouping::records_from_streams;
    use crate::models::ComparisonType;
    use crate::test_utils::{date, foreign_snapshot, household, stream, with_snapshots};

    fn household_streams() -> (Vec<Stream>, Vec<Provider>) {
        use crate::source::StreamSource;
        let source = household();
        let streams = source.fetch_streams(&Default::default()).unwrap();
        let providers = source.fetch_providers().unwrap();
        (streams, providers)
    }

    #[test]
    fn test_distribution_by_category_sums_to_100() {
        let (streams, providers) = household_streams();
        let report = distribution(&streams, &providers, GroupBy::Category, None);

        assert_eq!(report.items.len(), 4);
        assert_eq!(report.items[0].key, "Employment");
        assert!(report.items.windows(2).all(|w| w[0].amount_usd >= w[1].amount_usd));
        let pct: f64 = report.items.iter().map(|i| i.percentage).sum();
        assert!((pct - 100.0).abs() < 0.05, "sum = {}", pct);
    }

    #[test]
    fn test_distribution_by_provider_names_unknown() {
        let (streams, providers) = household_streams();
        let report = distribution(&streams, &providers, GroupBy::Provider, None);
        let keys: Vec<&str> = report.items.iter().map(|i| i.key.as_str()).collect();
        assert!(keys.contains(&"Acme Corp"));
        assert!(keys.contains(&"Upwork"));
        assert!(keys.contains(&"Unknown"));
    }

    #[test]
    fn test_distribution_by_currency() {
        let mut s = stream(1, "Staking", FlowDirection::Income);
        s.snapshots = vec![
            foreign_snapshot(1, "2024-01-01", 100.0, "eur", 1.1),
            foreign_snapshot(1, "2024-01-02", 1.0, "ETH", 2000.0),
        ];
        let report = distribution(&[s], &[], GroupBy::Currency, None);
        assert_eq!(report.items[0].key, "ETH");
        assert_eq!(report.items[1].key, "EUR");
        assert_eq!(report.total_usd, 2110.0);
    }

    #[test]
    fn test_distribution_empty_when_total_not_positive() {
        let report = distribution(&[], &[], GroupBy::Stream, None);
        assert!(report.items.is_empty());
        assert_eq!(report.total_usd, 0.0);

        let zero = with_snapshots(
            stream(1, "Idle", FlowDirection::Income),
            &[("2024-01-01", 0.0)],
        );
        assert!(distribution(&[zero], &[], GroupBy::Stream, None).items.is_empty());
    }

    #[test]
    fn test_top_performers_ranks_and_truncates() {
        let (streams, providers) = household_streams();
        let report = top_performers(&streams, &providers, 2, None);

        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].rank, 1);
        assert_eq!(report.items[0].name, "Salary");
        assert_eq!(report.items[0].provider.as_deref(), Some("Acme Corp"));
        assert_eq!(report.items[1].name, "Rent");
        // Percentages are of the selected pair
        assert_eq!(report.total_usd, 18000.0);
        assert!((report.items[0].percentage - 66.67).abs() < 1e-9);
        assert_eq!(report.items[0].avg_per_snapshot, 3000.0);
    }

    #[test]
    fn test_top_performers_window_drops_streams_without_snapshots() {
        let (streams, providers) = household_streams();
        let range = DateRange::new(date("2024-01-02"), date("2024-01-30"));
        let report = top_performers(&streams, &providers, 10, Some(range));
        let names: Vec<&str> = report.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Freelance", "Groceries"]);
        assert_eq!(report.items[1].snapshot_count, 2);
    }

    #[test]
    fn test_stream_health_classifies() {
        let growing = with_snapshots(
            stream(1, "Up", FlowDirection::Income),
            &[("2024-01-10", 100.0), ("2024-02-10", 150.0)],
        );
        let declining = with_snapshots(
            stream(2, "Down", FlowDirection::Income),
            &[("2024-01-10", 100.0), ("2024-02-10", 50.0)],
        );
        let flat = with_snapshots(
            stream(3, "Flat", FlowDirection::Income),
            &[("2024-01-10", 100.0), ("2024-02-10", 103.0)],
        );
        let new = with_snapshots(
            stream(4, "New", FlowDirection::Income),
            &[("2024-02-10", 10.0)],
        );

        let bounds = resolve_complete(ComparisonType::MoM, date("2024-02-15")).unwrap();
        let report = stream_health(&[growing, declining, flat, new], &bounds, 5.0);

        assert_eq!(report.growing_count, 2);
        assert_eq!(report.declining_count, 1);
        assert_eq!(report.stable_count, 1);
        let new = report.per_stream.iter().find(|s| s.name == "New").unwrap();
        assert_eq!(new.change_pct, 100.0);
        assert_eq!(new.status, HealthStatus::Growing);
    }

    #[test]
    fn test_trend_points_and_summary() {
        let buckets = vec![
            Bucket { key: date("2024-01-01"), amount: 100.0, count: 1 },
            Bucket { key: date("2024-02-01"), amount: 110.0, count: 2 },
            Bucket { key: date("2024-03-01"), amount: 121.0, count: 1 },
        ];
        let points = trend_points(&buckets, Granularity::Monthly);
        assert_eq!(points[0].label, "2024-01");
        assert_eq!(points[0].change_pct, None);
        assert_eq!(points[1].change_pct, Some(10.0));

        let summary = summarize_trend(&buckets, &GrowthConfig::default(), 5.0);
        assert_eq!(summary.growth_rate_pct, 21.0);
        assert_eq!(summary.direction, TrendDirection::Upward);
        assert_eq!(summary.avg_growth_per_period, 10.0);
        assert_eq!(summary.weighted_growth_rate_pct, 7.0);
    }

    #[test]
    fn test_trend_summary_single_point_is_flat() {
        let buckets = vec![Bucket { key: date("2024-01-01"), amount: 100.0, count: 1 }];
        let summary = summarize_trend(&buckets, &GrowthConfig::default(), 5.0);
        assert_eq!(summary.direction, TrendDirection::Stable);
        assert_eq!(summary.weighted_growth_rate_pct, 0.0);
    }

    #[test]
    fn test_seasonality_weekdays_and_months() {
        // 2024-01-01 is a Monday, 2024-01-06 a Saturday
        let s = with_snapshots(
            stream(1, "Sales", FlowDirection::Income),
            &[
                ("2024-01-01", 100.0),
                ("2024-01-08", 300.0),
                ("2024-01-06", 50.0),
                ("2024-02-05", 200.0),
            ],
        );
        let records = records_from_streams([&s], None);
        let range = DateRange::new(date("2024-01-01"), date("2024-02-29"));
        let report = seasonality(&records, range, Some(FlowDirection::Income));

        assert_eq!(report.day_of_week_stats.len(), 7);
        let monday = &report.day_of_week_stats[1];
        assert_eq!(monday.name, "Monday");
        assert_eq!(monday.days, 3);
        assert_eq!(monday.avg_usd, 200.0);
        assert_eq!(report.day_of_week_stats[0].days, 0);

        assert_eq!(report.month_of_year_stats.len(), 2);
        assert_eq!(report.best_day, "Monday");
        assert_eq!(report.worst_day, "Saturday");
        assert_eq!(report.best_month, "February");
        assert_eq!(report.worst_month, "January");
        assert_eq!(report.overall_daily_avg, 162.5);

        // (200 - 162.5) / 162.5
        assert_eq!(monday.deviation_pct, 23.08);
        assert_eq!(report.day_of_week_stats[6].deviation_pct, -69.23);
        // Weekdays without data do not deviate
        assert_eq!(report.day_of_week_stats[0].deviation_pct, 0.0);
        assert_eq!(report.month_of_year_stats[0].deviation_pct, -7.69);
        assert_eq!(report.month_of_year_stats[1].deviation_pct, 23.08);
    }

    #[test]
    fn test_seasonality_deviation_with_negative_net_flow() {
        // Monday +100 income, Tuesday -400 outcome: overall net -150 per day
        let sales = with_snapshots(
            stream(1, "Sales", FlowDirection::Income),
            &[("2024-01-01", 100.0)],
        );
        let rent = with_snapshots(
            stream(2, "Rent", FlowDirection::Outcome),
            &[("2024-01-02", 400.0)],
        );
        let records = records_from_streams([&sales, &rent], None);
        let range = DateRange::new(date("2024-01-01"), date("2024-01-31"));
        let report = seasonality(&records, range, None);

        assert_eq!(report.overall_daily_avg, -150.0);
        // Deviation is measured against |overall|, so above-average stays positive
        assert_eq!(report.day_of_week_stats[1].deviation_pct, 166.67);
        assert_eq!(report.day_of_week_stats[2].deviation_pct, -166.67);
        assert_eq!(report.month_of_year_stats[0].deviation_pct, 0.0);
        assert_eq!(report.best_day, "Monday");
        assert_eq!(report.worst_day, "Tuesday");
    }

    #[test]
    fn test_seasonality_without_data() {
        let range = DateRange::new(date("2024-01-01"), date("2024-02-29"));
        let report = seasonality(&[], range, None);
        assert_eq!(report.day_of_week_stats.len(), 7);
        assert!(report.month_of_year_stats.is_empty());
        assert_eq!(report.best_day, "N/A");
        assert_eq!(report.worst_month, "N/A");
    }
}
