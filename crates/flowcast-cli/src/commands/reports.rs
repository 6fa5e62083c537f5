//! Report command implementations
//!
//! Each command prints a table, or the raw payload with `--json`.

use anyhow::Result;
use chrono::NaiveDate;
use flowcast_core::analytics::{PercentileSet, TrendPoint};
use flowcast_core::models::{ComparisonType, DateRange, FlowDirection, GroupBy, StreamFilter};
use flowcast_core::{AnalyticsEngine, Database, MonteCarloParams, TrendParams};

use super::{print_json, signed_pct, truncate};

fn direction_label(direction: Option<FlowDirection>) -> &'static str {
    match direction {
        Some(FlowDirection::Income) => "income",
        Some(FlowDirection::Outcome) => "outcome",
        None => "net flow",
    }
}

pub fn cmd_overview(engine: &AnalyticsEngine<Database>, json: bool) -> Result<()> {
    let overview = engine.overview()?;
    if json {
        return print_json(&overview);
    }

    let rate = &overview.daily_rate;
    let cmp = &overview.comparison;
    let proj = &overview.projection;

    println!();
    println!("📊 Flowcast Overview (as of {})", overview.as_of);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Daily rate (30d):   ${:.2}/day  (total ${:.2})",
        rate.avg_daily, rate.total_usd
    );
    println!(
        "   Month over month:   ${:.2} vs ${:.2}  {} ({})",
        cmp.current_period.total_usd,
        cmp.previous_period.total_usd,
        signed_pct(cmp.change_pct),
        cmp.trend
    );
    println!(
        "   Stream health:      {} growing, {} declining, {} stable",
        overview.health.growing, overview.health.declining, overview.health.stable
    );
    println!(
        "   Projected income:   ${:.2}/month, ${:.2}/year (confidence {:.0}%)",
        proj.projected_monthly,
        proj.projected_annual,
        proj.confidence_score * 100.0
    );

    if !overview.top_performers.items.is_empty() {
        println!();
        println!("   Top streams:");
        for item in &overview.top_performers.items {
            println!(
                "   {:>2}. {:28} ${:>12.2}  {:>5.1}%",
                item.rank,
                truncate(&item.name, 28),
                item.total_usd,
                item.percentage
            );
        }
    }

    Ok(())
}

pub fn cmd_report_daily_rate(
    engine: &AnalyticsEngine<Database>,
    days: u32,
    filter: &StreamFilter,
    json: bool,
) -> Result<()> {
    let report = engine.daily_rate(days, filter)?;
    if json {
        return print_json(&report);
    }

    println!();
    println!("📈 Daily Rate ({})", direction_label(report.direction));
    println!(
        "   Period: {} to {} ({} days)",
        report.date_range.from, report.date_range.to, report.days_analyzed
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Average:   ${:.2}/day", report.avg_daily);
    println!("   Median:    ${:.2}/day", report.median_daily);
    println!("   Std dev:   ${:.2}", report.std_dev);
    println!("   CV:        {:.1}%", report.coefficient_of_variation);
    println!("   Total:     ${:.2}", report.total_usd);

    Ok(())
}

pub fn cmd_report_compare(
    engine: &AnalyticsEngine<Database>,
    comparison: ComparisonType,
    reference: Option<NaiveDate>,
    filter: &StreamFilter,
    json: bool,
) -> Result<()> {
    let report = engine.period_comparison(comparison, reference, filter)?;
    if json {
        return print_json(&report);
    }

    let current = &report.current_period;
    let previous = &report.previous_period;

    println!();
    println!(
        "⚖️  Period Comparison ({}, {:?} periods)",
        report.comparison, report.mode
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:9} │ {:10} │ {:10} │ {:>12} │ {:>5}",
        "Period", "Start", "End", "Total", "Count"
    );
    println!("   ──────────┼────────────┼────────────┼──────────────┼───────");
    for (label, period) in [("Current", current), ("Previous", previous)] {
        println!(
            "   {:9} │ {:10} │ {:10} │ {:>12.2} │ {:>5}",
            label,
            period.start.to_string(),
            period.end.to_string(),
            period.total_usd,
            period.snapshot_count
        );
    }
    println!();
    println!(
        "   Change: ${:.2} ({}) - {}",
        report.change_usd,
        signed_pct(report.change_pct),
        report.trend
    );

    Ok(())
}

pub fn cmd_report_distribution(
    engine: &AnalyticsEngine<Database>,
    group_by: GroupBy,
    range: Option<DateRange>,
    filter: &StreamFilter,
    json: bool,
) -> Result<()> {
    let report = engine.distribution(group_by, range, filter)?;
    if json {
        return print_json(&report);
    }

    println!();
    println!("🥧 Distribution by {}", report.group_by);
    if let Some(range) = range {
        println!("   Period: {} to {}", range.from, range.to);
    }
    println!("   ─────────────────────────────────────────────────────────────");

    if report.items.is_empty() {
        println!("   No snapshots found.");
        return Ok(());
    }

    println!("   Total: ${:.2}", report.total_usd);
    println!();
    println!("   {:28} │ {:>12} │ {:>6} │ {:>5}", "Key", "Amount", "%", "Count");
    println!("   ─────────────────────────────┼──────────────┼────────┼───────");
    for item in &report.items {
        println!(
            "   {:28} │ {:>12.2} │ {:>5.1}% │ {:>5}",
            truncate(&item.key, 28),
            item.amount_usd,
            item.percentage,
            item.snapshot_count
        );
    }

    Ok(())
}

pub fn cmd_report_top(
    engine: &AnalyticsEngine<Database>,
    limit: usize,
    range: Option<DateRange>,
    direction: Option<FlowDirection>,
    json: bool,
) -> Result<()> {
    let report = engine.top_performers(limit, range, direction)?;
    if json {
        return print_json(&report);
    }

    println!();
    println!("🏆 Top {} Streams", limit);
    println!("   ─────────────────────────────────────────────────────────────");

    if report.items.is_empty() {
        println!("   No snapshots found.");
        return Ok(());
    }

    println!(
        "   {:>3} │ {:24} │ {:16} │ {:8} │ {:>12} │ {:>6}",
        "#", "Stream", "Provider", "Dir", "Total", "%"
    );
    println!("   ────┼──────────────────────────┼──────────────────┼──────────┼──────────────┼────────");
    for item in &report.items {
        println!(
            "   {:>3} │ {:24} │ {:16} │ {:8} │ {:>12.2} │ {:>5.1}%",
            item.rank,
            truncate(&item.name, 24),
            truncate(item.provider.as_deref().unwrap_or("-"), 16),
            item.direction.as_str(),
            item.total_usd,
            item.percentage
        );
    }
    println!();
    println!("   Total of shown streams: ${:.2}", report.total_usd);

    Ok(())
}

fn print_points(points: &[TrendPoint]) {
    println!("   {:10} │ {:>12} │ {:>5} │ {:>8}", "Period", "Amount", "Count", "Change");
    println!("   ───────────┼──────────────┼───────┼──────────");
    for point in points {
        let change = point
            .change_pct
            .map(signed_pct)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:10} │ {:>12.2} │ {:>5} │ {:>8}",
            point.label, point.amount_usd, point.snapshot_count, change
        );
    }
}

pub fn cmd_report_trend(
    engine: &AnalyticsEngine<Database>,
    params: &TrendParams,
    json: bool,
) -> Result<()> {
    let report = engine.trend(params)?;
    if json {
        return print_json(&report);
    }

    println!();
    println!(
        "📉 {} Trend ({}, last {} periods)",
        direction_label(report.direction_filter),
        report.granularity,
        params.periods_back
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if report.points.is_empty() {
        println!("   No snapshots found.");
        return Ok(());
    }

    print_points(&report.points);
    println!();
    println!(
        "   Growth: {} overall, {} average per period, {} weighted - {}",
        signed_pct(report.growth_rate_pct),
        signed_pct(report.avg_growth_per_period),
        signed_pct(report.weighted_growth_rate_pct),
        report.direction
    );

    for series in &report.series {
        println!();
        println!("   ▸ {}", series.key);
        print_points(&series.points);
    }

    Ok(())
}

pub fn cmd_report_health(
    engine: &AnalyticsEngine<Database>,
    comparison: ComparisonType,
    filter: &StreamFilter,
    json: bool,
) -> Result<()> {
    let report = engine.stream_trends(comparison, filter)?;
    if json {
        return print_json(&report);
    }

    println!();
    println!("🩺 Stream Health ({})", report.comparison);
    println!(
        "   Current {} to {} vs previous {} to {}",
        report.current_start, report.current_end, report.previous_start, report.previous_end
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if report.per_stream.is_empty() {
        println!("   No streams found.");
        return Ok(());
    }

    println!(
        "   {:24} │ {:>12} │ {:>12} │ {:>8} │ {:9}",
        "Stream", "Current", "Previous", "Change", "Status"
    );
    println!("   ─────────────────────────┼──────────────┼──────────────┼──────────┼──────────");
    for s in &report.per_stream {
        println!(
            "   {:24} │ {:>12.2} │ {:>12.2} │ {:>8} │ {:9}",
            truncate(&s.name, 24),
            s.current_usd,
            s.previous_usd,
            signed_pct(s.change_pct),
            s.status.as_str()
        );
    }
    println!();
    println!(
        "   {} growing, {} declining, {} stable",
        report.growing_count, report.declining_count, report.stable_count
    );

    Ok(())
}

pub fn cmd_report_seasonality(
    engine: &AnalyticsEngine<Database>,
    months: u32,
    filter: &StreamFilter,
    json: bool,
) -> Result<()> {
    let report = engine.seasonality(months, filter)?;
    if json {
        return print_json(&report);
    }

    println!();
    println!(
        "🗓️  Seasonality ({} to {})",
        report.date_range.from, report.date_range.to
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Overall daily average: ${:.2}", report.overall_daily_avg);
    println!();
    println!("   {:10} │ {:>12} │ {:>5} │ {:>9}", "Weekday", "Avg", "Days", "vs avg");
    println!("   ───────────┼──────────────┼───────┼───────────");
    for day in &report.day_of_week_stats {
        println!(
            "   {:10} │ {:>12.2} │ {:>5} │ {:>9}",
            day.name,
            day.avg_usd,
            day.days,
            signed_pct(day.deviation_pct)
        );
    }

    if !report.month_of_year_stats.is_empty() {
        println!();
        println!("   {:10} │ {:>12} │ {:>5} │ {:>9}", "Month", "Avg", "Days", "vs avg");
        println!("   ───────────┼──────────────┼───────┼───────────");
        for month in &report.month_of_year_stats {
            println!(
                "   {:10} │ {:>12.2} │ {:>5} │ {:>9}",
                month.name,
                month.avg_usd,
                month.days,
                signed_pct(month.deviation_pct)
            );
        }
    }

    println!();
    println!(
        "   Best day: {}, worst day: {}",
        report.best_day, report.worst_day
    );
    println!(
        "   Best month: {}, worst month: {}",
        report.best_month, report.worst_month
    );

    Ok(())
}

pub fn cmd_report_projection(
    engine: &AnalyticsEngine<Database>,
    months: u32,
    filter: &StreamFilter,
    json: bool,
) -> Result<()> {
    let report = engine.projection(months, filter)?;
    if json {
        return print_json(&report);
    }

    println!();
    println!("🔮 {} Projection ({} months)", report.direction, report.months_ahead);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Fixed:      ${:.2}/month", report.fixed_monthly);
    println!(
        "   Variable:   ${:.2}/month (std dev ${:.2})",
        report.variable_monthly, report.variable_std_dev
    );
    println!("   Growth:     {}/month", signed_pct(report.growth_rate_pct));
    println!("   Confidence: {:.0}%", report.confidence_score * 100.0);
    println!();
    println!(
        "   {:8} │ {:>12} │ {:>12} │ {:>12}",
        "Month", "Projected", "Low", "High"
    );
    println!("   ─────────┼──────────────┼──────────────┼──────────────");
    for m in &report.monthly_projections {
        println!(
            "   {:8} │ {:>12.2} │ {:>12.2} │ {:>12.2}",
            m.month, m.projected_usd, m.lower_bound, m.upper_bound
        );
    }
    println!();
    println!(
        "   Monthly: ${:.2}   Annual: ${:.2}",
        report.projected_monthly, report.projected_annual
    );

    if !report.fixed_streams.is_empty() {
        println!();
        println!("   Fixed streams:");
        for s in &report.fixed_streams {
            println!(
                "   - {:24} ${:>10.2} ({}) = ${:.2}/month",
                truncate(&s.name, 24),
                s.latest_usd,
                s.period.map(|p| p.as_str()).unwrap_or("monthly"),
                s.monthly_equivalent
            );
        }
    }

    Ok(())
}

fn print_percentiles(label: &str, p: &PercentileSet) {
    println!(
        "   {:8} │ {:>11.2} │ {:>11.2} │ {:>11.2} │ {:>11.2} │ {:>11.2}",
        label, p.p10, p.p25, p.p50, p.p75, p.p90
    );
}

pub fn cmd_report_monte_carlo(
    engine: &AnalyticsEngine<Database>,
    params: &MonteCarloParams,
    json: bool,
) -> Result<()> {
    let report = engine.monte_carlo(params)?;
    if json {
        return print_json(&report);
    }

    let inputs = &report.inputs_summary;

    println!();
    println!(
        "🎲 Monte Carlo ({} simulations, {} months, seed {})",
        report.simulations, report.months_ahead, report.seed
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Inputs: fixed ${:.2}, variable ${:.2} ± ${:.2}, growth {}",
        inputs.fixed_monthly,
        inputs.variable_monthly,
        inputs.effective_std_dev,
        signed_pct(inputs.growth_rate_pct)
    );
    println!();
    println!(
        "   {:8} │ {:>11} │ {:>11} │ {:>11} │ {:>11} │ {:>11}",
        "Month", "P10", "P25", "P50", "P75", "P90"
    );
    println!("   ─────────┼─────────────┼─────────────┼─────────────┼─────────────┼─────────────");
    for month in &report.monthly_percentiles {
        print_percentiles(&month.month.to_string(), &month.percentiles);
    }
    println!();
    print_percentiles("Final", &report.percentiles);
    println!("   Mean outcome: ${:.2}", report.mean_outcome);

    if let Some(goal) = report.goal_amount {
        println!(
            "   Probability of reaching ${:.2}: {:.1}%",
            goal, report.goal_probability_pct
        );
    }

    Ok(())
}
