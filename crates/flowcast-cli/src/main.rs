//! Flowcast CLI - Stream analytics and forecasting
//!
//! Usage:
//!   flowcast init                      Initialize database
//!   flowcast load --file data.json     Load streams and snapshots
//!   flowcast report trend --json       Run a report
//!   flowcast serve --port 3000         Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use flowcast_core::{MonteCarloParams, TrendParams};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Load { file, replace } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_load(&db, &file, replace)
        }
        Commands::Streams { filter, json } => {
            let db = commands::open_db(&cli.db)?;
            let filter = commands::resolve_filter(&db, &filter)?;
            commands::cmd_streams(&db, &filter, json)
        }
        Commands::Overview { json } => {
            let engine = commands::open_engine(&cli.db, config)?;
            commands::cmd_overview(&engine, json)
        }
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, config, &host, port, no_auth).await,
        Commands::Report { json, report_type } => {
            let engine = commands::open_engine(&cli.db, config)?;
            let db = engine.source();
            match report_type {
                ReportType::DailyRate { days, filter } => {
                    let filter = commands::resolve_filter(db, &filter)?;
                    commands::cmd_report_daily_rate(&engine, days, &filter, json)
                }
                ReportType::Compare {
                    comparison,
                    reference,
                    filter,
                } => {
                    let filter = commands::resolve_filter(db, &filter)?;
                    commands::cmd_report_compare(&engine, comparison, reference, &filter, json)
                }
                ReportType::Distribution {
                    group_by,
                    from,
                    to,
                    filter,
                } => {
                    let filter = commands::resolve_filter(db, &filter)?;
                    let range = commands::resolve_range(&engine, from.as_deref(), to.as_deref())?;
                    commands::cmd_report_distribution(&engine, group_by, range, &filter, json)
                }
                ReportType::Top {
                    limit,
                    from,
                    to,
                    direction,
                } => {
                    let range = commands::resolve_range(&engine, from.as_deref(), to.as_deref())?;
                    commands::cmd_report_top(&engine, limit, range, direction, json)
                }
                ReportType::Trend {
                    granularity,
                    periods,
                    breakdown,
                    filter,
                } => {
                    let mut params = TrendParams::new(granularity, periods);
                    params.filter = commands::resolve_filter(db, &filter)?;
                    params.breakdown = breakdown;
                    commands::cmd_report_trend(&engine, &params, json)
                }
                ReportType::Health { comparison, filter } => {
                    let filter = commands::resolve_filter(db, &filter)?;
                    commands::cmd_report_health(&engine, comparison, &filter, json)
                }
                ReportType::Seasonality { months, filter } => {
                    let filter = commands::resolve_filter(db, &filter)?;
                    commands::cmd_report_seasonality(&engine, months, &filter, json)
                }
                ReportType::Projection { months, filter } => {
                    let filter = commands::resolve_filter(db, &filter)?;
                    commands::cmd_report_projection(&engine, months, &filter, json)
                }
                ReportType::MonteCarlo {
                    simulations,
                    months,
                    goal,
                    seed,
                    filter,
                } => {
                    let params = MonteCarloParams {
                        simulations,
                        months_ahead: months,
                        goal,
                        seed,
                        filter: commands::resolve_filter(db, &filter)?,
                    };
                    commands::cmd_report_monte_carlo(&engine, &params, json)
                }
            }
        }
    }
}
