//! Granularity grouping
//!
//! Buckets flat `(date, usd_amount, direction)` records by day, week, month,
//! quarter, or year. With a direction filter a bucket is the plain sum of the
//! matching records; without one it is the net flow (income minus outcome).

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::periods::{
    days_before, month_start, quarter_index, quarter_start, shift_months, week_start, year_start,
};
use crate::models::{DateRange, FlowDirection, Granularity, Stream};

/// One snapshot reduced to what grouping needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowRecord {
    pub date: NaiveDate,
    pub usd_amount: f64,
    pub direction: FlowDirection,
}

/// Aggregated amount for one bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// First day of the bucket
    pub key: NaiveDate,
    pub amount: f64,
    /// Number of contributing records
    pub count: usize,
}

/// One keyed series of buckets from a stacked grouping
#[derive(Debug, Clone, PartialEq)]
pub struct Series<K> {
    pub key: K,
    pub buckets: Vec<Bucket>,
}

/// First day of the bucket that contains `date`
pub fn bucket_key(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Daily => date,
        Granularity::Weekly => week_start(date),
        Granularity::Monthly => month_start(date),
        Granularity::Quarterly => quarter_start(date),
        Granularity::Yearly => year_start(date),
    }
}

/// Display label for a bucket key
pub fn bucket_label(key: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily | Granularity::Weekly => key.format("%Y-%m-%d").to_string(),
        Granularity::Monthly => key.format("%Y-%m").to_string(),
        Granularity::Quarterly => format!("{}-Q{}", key.year(), quarter_index(key) + 1),
        Granularity::Yearly => key.year().to_string(),
    }
}

/// Step back `periods` buckets from the bucket containing `date`
///
/// `None` when the target bucket falls before the representable calendar.
pub fn bucket_start_back(
    date: NaiveDate,
    granularity: Granularity,
    periods: u32,
) -> Option<NaiveDate> {
    let key = bucket_key(date, granularity);
    let n = i64::from(periods);
    match granularity {
        Granularity::Daily => days_before(key, n),
        Granularity::Weekly => days_before(key, 7 * n),
        Granularity::Monthly => shift_months(key, -n),
        Granularity::Quarterly => shift_months(key, -3 * n),
        Granularity::Yearly => shift_months(key, -12 * n),
    }
}

/// Flatten stream snapshots inside an optional window into records
pub fn records_from_streams<'a, I>(streams: I, range: Option<DateRange>) -> Vec<FlowRecord>
where
    I: IntoIterator<Item = &'a Stream>,
{
    streams
        .into_iter()
        .flat_map(|stream| {
            stream
                .snapshots
                .iter()
                .filter(move |s| range.map_or(true, |r| r.contains(s.date)))
                .map(move |s| FlowRecord {
                    date: s.date,
                    usd_amount: s.usd_amount,
                    direction: stream.direction,
                })
        })
        .collect()
}

/// Group records into ordered buckets
///
/// Buckets without records are not emitted.
pub fn group_records(
    records: &[FlowRecord],
    granularity: Granularity,
    filter: Option<FlowDirection>,
) -> Vec<Bucket> {
    // key -> (income, outcome, count)
    let mut acc: BTreeMap<NaiveDate, (f64, f64, usize)> = BTreeMap::new();

    for record in records {
        if filter.is_some_and(|d| d != record.direction) {
            continue;
        }
        let entry = acc
            .entry(bucket_key(record.date, granularity))
            .or_insert((0.0, 0.0, 0));
        match record.direction {
            FlowDirection::Income => entry.0 += record.usd_amount,
            FlowDirection::Outcome => entry.1 += record.usd_amount,
        }
        entry.2 += 1;
    }

    acc.into_iter()
        .map(|(key, (income, outcome, count))| {
            let amount = match filter {
                Some(FlowDirection::Income) => income,
                Some(FlowDirection::Outcome) => outcome,
                None => income - outcome,
            };
            Bucket { key, amount, count }
        })
        .collect()
}

/// Group items into one bucket series per key
///
/// `record_of` reduces an item to a flow record and `key_of` picks the
/// series it belongs to. Series come out ordered by key; series whose
/// records were all filtered away are dropped.
pub fn group_stacked<T, K, R, F>(
    items: &[T],
    granularity: Granularity,
    filter: Option<FlowDirection>,
    record_of: R,
    key_of: F,
) -> Vec<Series<K>>
where
    K: Ord,
    R: Fn(&T) -> FlowRecord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<FlowRecord>> = BTreeMap::new();
    for item in items {
        groups.entry(key_of(item)).or_default().push(record_of(item));
    }

    groups
        .into_iter()
        .map(|(key, records)| Series {
            key,
            buckets: group_records(&records, granularity, filter),
        })
        .filter(|s| !s.buckets.is_empty())
        .collect()
}

/// Daily totals for every day of the window, zero where nothing happened
pub fn daily_series(
    records: &[FlowRecord],
    range: DateRange,
    filter: Option<FlowDirection>,
) -> Vec<(NaiveDate, f64)> {
    let in_range: Vec<FlowRecord> = records
        .iter()
        .copied()
        .filter(|r| range.contains(r.date))
        .collect();
    let buckets: BTreeMap<NaiveDate, f64> = group_records(&in_range, Granularity::Daily, filter)
        .into_iter()
        .map(|b| (b.key, b.amount))
        .collect();

    range
        .from
        .iter_days()
        .take_while(|d| *d <= range.to)
        .map(|d| (d, buckets.get(&d).copied().unwrap_or(0.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(on: &str, amount: f64, direction: FlowDirection) -> FlowRecord {
        FlowRecord {
            date: d(on),
            usd_amount: amount,
            direction,
        }
    }

    fn sample() -> Vec<FlowRecord> {
        vec![
            rec("2024-01-05", 100.0, FlowDirection::Income),
            rec("2024-01-10", 40.0, FlowDirection::Outcome),
            rec("2024-02-15", 100.0, FlowDirection::Income),
            rec("2024-04-20", 50.0, FlowDirection::Outcome),
        ]
    }

    #[test]
    fn test_bucket_keys() {
        let date = d("2024-05-15"); // Wednesday
        assert_eq!(bucket_key(date, Granularity::Daily), date);
        assert_eq!(bucket_key(date, Granularity::Weekly), d("2024-05-12"));
        assert_eq!(bucket_key(date, Granularity::Monthly), d("2024-05-01"));
        assert_eq!(bucket_key(date, Granularity::Quarterly), d("2024-04-01"));
        assert_eq!(bucket_key(date, Granularity::Yearly), d("2024-01-01"));
    }

    #[test]
    fn test_bucket_labels() {
        assert_eq!(bucket_label(d("2024-04-01"), Granularity::Quarterly), "2024-Q2");
        assert_eq!(bucket_label(d("2024-04-01"), Granularity::Monthly), "2024-04");
        assert_eq!(bucket_label(d("2024-01-01"), Granularity::Yearly), "2024");
    }

    #[test]
    fn test_net_flow_without_filter() {
        let buckets = group_records(&sample(), Granularity::Monthly, None);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].key, d("2024-01-01"));
        assert_eq!(buckets[0].amount, 60.0);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[2].amount, -50.0);
    }

    #[test]
    fn test_filtered_sum_drops_other_direction() {
        let buckets = group_records(&sample(), Granularity::Quarterly, Some(FlowDirection::Income));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].amount, 200.0);
        assert_eq!(buckets[0].count, 2);
    }

    #[test]
    fn test_buckets_are_ordered() {
        let mut records = sample();
        records.reverse();
        let buckets = group_records(&records, Granularity::Daily, None);
        assert!(buckets.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn test_stacked_grouping_with_typed_accessor() {
        let items = vec![
            ("Salary", rec("2024-01-05", 100.0, FlowDirection::Income)),
            ("Bonus", rec("2024-01-20", 50.0, FlowDirection::Income)),
            ("Salary", rec("2024-02-05", 100.0, FlowDirection::Income)),
            ("Rent", rec("2024-02-01", 70.0, FlowDirection::Outcome)),
        ];
        let series = group_stacked(
            &items,
            Granularity::Monthly,
            Some(FlowDirection::Income),
            |(_, r)| *r,
            |(name, _)| name.to_string(),
        );

        // Rent is filtered out entirely
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].key, "Bonus");
        assert_eq!(series[1].key, "Salary");
        assert_eq!(series[1].buckets.len(), 2);
    }

    #[test]
    fn test_daily_series_zero_fills() {
        let range = DateRange::new(d("2024-01-04"), d("2024-01-11"));
        let series = daily_series(&sample(), range, None);
        assert_eq!(series.len(), 8);
        assert_eq!(series[1], (d("2024-01-05"), 100.0));
        assert_eq!(series[6], (d("2024-01-10"), -40.0));
        assert_eq!(series[0].1, 0.0);
    }

    #[test]
    fn test_bucket_start_back() {
        let today = d("2024-05-15");
        assert_eq!(
            bucket_start_back(today, Granularity::Monthly, 2),
            Some(d("2024-03-01"))
        );
        assert_eq!(
            bucket_start_back(today, Granularity::Weekly, 1),
            Some(d("2024-05-05"))
        );
        assert_eq!(
            bucket_start_back(today, Granularity::Quarterly, 4),
            Some(d("2023-04-01"))
        );
        assert_eq!(
            bucket_start_back(today, Granularity::Monthly, 4_000_000),
            None
        );
        assert_eq!(bucket_start_back(today, Granularity::Daily, u32::MAX), None);
    }
}
