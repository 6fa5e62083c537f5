//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use flowcast_core::models::{ComparisonType, FlowDirection, Granularity, GroupBy};

/// Flowcast - Analyze and forecast income and expense streams
#[derive(Parser)]
#[command(name = "flowcast")]
#[command(about = "Stream and snapshot analytics: trends, seasonality, and forecasts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "flowcast.db", global = true)]
    pub db: PathBuf,

    /// Engine config file (defaults to <data dir>/flowcast/engine.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Load streams and snapshots from a JSON dataset or snapshot CSV
    Load {
        /// Dataset file (.json or .csv)
        #[arg(short, long)]
        file: PathBuf,

        /// Drop existing streams and snapshots before loading
        #[arg(long)]
        replace: bool,
    },

    /// List streams
    Streams {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print the raw JSON payload
        #[arg(long)]
        json: bool,
    },

    /// Dashboard summary: daily rate, comparison, top streams, health, projection
    Overview {
        /// Print the raw JSON payload
        #[arg(long)]
        json: bool,
    },

    /// Generate reports
    Report {
        /// Print the raw JSON payload
        #[arg(long, global = true)]
        json: bool,

        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        #[arg(long)]
        no_auth: bool,
    },
}

/// Stream filters shared by most reports
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Flow direction: income or outcome
    #[arg(long)]
    pub direction: Option<FlowDirection>,

    /// Provider name
    #[arg(long)]
    pub provider: Option<String>,

    /// Category label (case-insensitive)
    #[arg(long)]
    pub category: Option<String>,

    /// Stream id
    #[arg(long)]
    pub stream: Option<i64>,
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Average daily flow over a trailing window
    DailyRate {
        /// Window length in days, ending today
        #[arg(long, default_value = "30")]
        days: u32,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Current vs previous period
    Compare {
        /// Comparison: mom, wow, qoq, yoy
        #[arg(long, default_value = "mom")]
        comparison: ComparisonType,

        /// Reference date (YYYY-MM-DD); a past date compares complete periods
        #[arg(long)]
        reference: Option<NaiveDate>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Share of the total per key
    Distribution {
        /// Group by: category, provider, stream, currency
        #[arg(long, default_value = "category")]
        group_by: GroupBy,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Streams ranked by total
    Top {
        /// Number of streams to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Flow direction: income or outcome
        #[arg(long)]
        direction: Option<FlowDirection>,
    },

    /// Totals over time with growth rates
    Trend {
        /// Granularity: daily, weekly, monthly, quarterly, yearly
        #[arg(long, default_value = "monthly")]
        granularity: Granularity,

        /// Number of periods, ending with the current one
        #[arg(long, default_value = "12")]
        periods: u32,

        /// Add a series per key: category, provider, stream, currency
        #[arg(long)]
        breakdown: Option<GroupBy>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Per-stream growth between two periods
    Health {
        /// Comparison: mom, wow, qoq, yoy
        #[arg(long, default_value = "mom")]
        comparison: ComparisonType,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Day-of-week and month-of-year patterns
    Seasonality {
        /// Months of history to analyze
        #[arg(long, default_value = "12")]
        months: u32,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Deterministic monthly forecast with confidence bands
    Projection {
        /// Months to project
        #[arg(long, default_value = "12")]
        months: u32,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Simulated outcome distribution
    MonteCarlo {
        /// Number of simulated paths (defaults to the configured value)
        #[arg(long)]
        simulations: Option<usize>,

        /// Months to simulate
        #[arg(long, default_value = "12")]
        months: u32,

        /// Cumulative goal amount for the success probability
        #[arg(long)]
        goal: Option<f64>,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}
