//! Integration tests for flowcast-core
//!
//! These tests exercise the full load → store → engine workflow.

use chrono::NaiveDate;
use flowcast_core::{
    analytics::{HealthStatus, PeriodMode, TrendDirection},
    import::{load_dataset, parse_dataset, parse_snapshot_csv},
    models::{ComparisonType, FlowDirection, Granularity, GroupBy, StreamFilter},
    AnalyticsEngine, Database, MonteCarloParams, TrendParams,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Three $100 incomes and two $40 outcomes in January 2024
fn january_csv() -> &'static str {
    "stream,direction,date,amount,category\n\
     Consulting,income,2024-01-05,100,Services\n\
     Consulting,income,2024-01-15,100,Services\n\
     Consulting,income,2024-01-25,100,Services\n\
     Hosting,outcome,2024-01-10,40,Infrastructure\n\
     Hosting,outcome,2024-01-20,40,Infrastructure\n"
}

/// A year of fixed salary, growing freelance income, and rent
fn household_json() -> String {
    let mut salary = Vec::new();
    let mut freelance = Vec::new();
    let mut rent = Vec::new();
    for month in 1..=12 {
        salary.push(format!(
            r#"{{"date":"2023-{:02}-28","amount":4000,"usd_amount":4000}}"#,
            month
        ));
        let amount = 1000.0 + 50.0 * month as f64;
        freelance.push(format!(
            r#"{{"date":"2023-{:02}-15","amount":{},"usd_amount":{}}}"#,
            month, amount, amount
        ));
        rent.push(format!(
            r#"{{"date":"2023-{:02}-01","amount":1800,"usd_amount":1800}}"#,
            month
        ));
    }

    format!(
        r#"{{"streams":[
            {{"name":"Salary","provider":"Acme Corp","category":"Employment","direction":"income","is_fixed":true,"fixed_period":"monthly","snapshots":[{}]}},
            {{"name":"Freelance","provider":"Upwork","category":"Contracting","direction":"income","snapshots":[{}]}},
            {{"name":"Rent","category":"Housing","direction":"outcome","is_fixed":true,"fixed_period":"monthly","snapshots":[{}]}}
        ]}}"#,
        salary.join(","),
        freelance.join(","),
        rent.join(",")
    )
}

fn household_db() -> Database {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let dataset = parse_dataset(household_json().as_bytes()).expect("Failed to parse dataset");
    let stats = load_dataset(&db, &dataset).expect("Failed to load dataset");
    assert_eq!(stats.snapshots_created, 36);
    db
}

// =============================================================================
// Load → Store → Engine
// =============================================================================

#[test]
fn test_csv_scenario_daily_rate_through_store() {
    let db = Database::in_memory().unwrap();
    let (dataset, skipped) = parse_snapshot_csv(january_csv().as_bytes()).unwrap();
    assert_eq!(skipped, 0);
    load_dataset(&db, &dataset).unwrap();

    let engine = AnalyticsEngine::new(db).with_today(date("2024-01-30"));
    let report = engine.daily_rate(30, &StreamFilter::default()).unwrap();

    assert_eq!(report.total_usd, 220.0);
    assert!((report.avg_daily - 7.33).abs() < 0.005);
    assert_eq!(report.days_analyzed, 30);
}

#[test]
fn test_store_and_in_memory_sources_agree() {
    let dataset = parse_dataset(household_json().as_bytes()).unwrap();
    let db = Database::in_memory().unwrap();
    load_dataset(&db, &dataset).unwrap();

    let today = date("2023-12-31");
    let from_store = AnalyticsEngine::new(db).with_today(today);
    let from_memory = AnalyticsEngine::new(dataset.to_source()).with_today(today);

    let params = TrendParams::new(Granularity::Quarterly, 4);
    assert_eq!(
        from_store.trend(&params).unwrap(),
        from_memory.trend(&params).unwrap()
    );
    assert_eq!(
        from_store.projection(6, &StreamFilter::default()).unwrap(),
        from_memory.projection(6, &StreamFilter::default()).unwrap()
    );
}

#[test]
fn test_distribution_percentages_sum_to_100() {
    let engine = AnalyticsEngine::new(household_db()).with_today(date("2023-12-31"));

    for group_by in [
        GroupBy::Category,
        GroupBy::Provider,
        GroupBy::Stream,
        GroupBy::Currency,
    ] {
        let report = engine
            .distribution(group_by, None, &StreamFilter::default())
            .unwrap();
        let sum: f64 = report.items.iter().map(|i| i.percentage).sum();
        assert!((sum - 100.0).abs() < 0.05, "{:?} sums to {}", group_by, sum);
    }

    // Nothing in the window -> no items
    let empty = engine
        .distribution(
            GroupBy::Category,
            Some(flowcast_core::models::DateRange::new(
                date("2030-01-01"),
                date("2030-12-31"),
            )),
            &StreamFilter::default(),
        )
        .unwrap();
    assert!(empty.items.is_empty());
}

#[test]
fn test_trend_identical_calls_are_identical() {
    let engine = AnalyticsEngine::new(household_db()).with_today(date("2023-12-31"));
    let mut params = TrendParams::new(Granularity::Monthly, 12);
    params.breakdown = Some(GroupBy::Provider);

    let first = engine.trend(&params).unwrap();
    let second = engine.trend(&params).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.points.len(), 12);
    assert_eq!(first.series.len(), 3);
}

#[test]
fn test_growing_income_trend_and_health() {
    let engine = AnalyticsEngine::new(household_db()).with_today(date("2023-12-31"));

    let mut params = TrendParams::new(Granularity::Monthly, 12);
    params.filter = StreamFilter::direction(FlowDirection::Income);
    let trend = engine.trend(&params).unwrap();
    assert_eq!(trend.direction, TrendDirection::Upward);
    assert!(trend.weighted_growth_rate_pct > 0.0);

    let health = engine
        .stream_trends(
            ComparisonType::QoQ,
            &StreamFilter::direction(FlowDirection::Income),
        )
        .unwrap();
    assert_eq!(health.mode, PeriodMode::Equivalent);
    let freelance = health
        .per_stream
        .iter()
        .find(|s| s.name == "Freelance")
        .unwrap();
    assert_eq!(freelance.status, HealthStatus::Growing);
    let salary = health.per_stream.iter().find(|s| s.name == "Salary").unwrap();
    assert_eq!(salary.status, HealthStatus::Stable);
}

#[test]
fn test_period_comparison_resolves_equivalent_february() {
    let engine = AnalyticsEngine::new(household_db()).with_today(date("2023-03-31"));
    let report = engine
        .period_comparison(ComparisonType::MoM, None, &StreamFilter::default())
        .unwrap();
    assert_eq!(report.mode, PeriodMode::Equivalent);
    assert_eq!(report.previous_period.end, date("2023-02-28"));
}

#[test]
fn test_monte_carlo_percentiles_are_ordered() {
    let engine = AnalyticsEngine::new(household_db()).with_today(date("2023-12-31"));
    let params = MonteCarloParams {
        simulations: Some(2_000),
        months_ahead: 12,
        goal: Some(60_000.0),
        seed: Some(2024),
        filter: StreamFilter::default(),
    };
    let report = engine.monte_carlo(&params).unwrap();

    for month in &report.monthly_percentiles {
        let p = month.percentiles;
        assert!(p.p10 <= p.p25);
        assert!(p.p25 <= p.p50);
        assert!(p.p50 <= p.p75);
        assert!(p.p75 <= p.p90);
    }
    assert_eq!(
        report.distribution_buckets.iter().map(|b| b.count).sum::<usize>(),
        2_000
    );
    assert!(report.goal_probability_pct > 0.0);
    assert_eq!(report.inputs_summary.fixed_monthly, 4000.0);
}

#[test]
fn test_overview_on_empty_store() {
    let engine = AnalyticsEngine::new(Database::in_memory().unwrap()).with_today(date("2024-06-01"));
    let overview = engine.overview().unwrap();

    assert_eq!(overview.daily_rate.total_usd, 0.0);
    assert!(overview.top_performers.items.is_empty());
    assert_eq!(overview.health.growing, 0);
    assert_eq!(overview.projection.projected_monthly, 0.0);
}
