//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` / `open_engine` - Shared utilities to open the store and engine
//! - `resolve_filter` / `resolve_range` - Turn CLI arguments into engine parameters
//! - `cmd_init` - Initialize the database
//! - `cmd_load` - Load a dataset file
//! - `cmd_streams` - List streams

use std::path::Path;

use anyhow::{Context, Result};
use flowcast_core::models::{DateRange, StreamFilter, StreamSummary};
use flowcast_core::{import, AnalyticsEngine, Database, EngineConfig};

use super::{print_json, truncate};
use crate::cli::FilterArgs;

/// Open (or create) the database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Load engine configuration from `--config` or the default location
pub fn load_config(config_path: Option<&Path>) -> Result<EngineConfig> {
    EngineConfig::load(config_path).context("Failed to load engine config")
}

/// Open the store and wrap it in an analytics engine
pub fn open_engine(db_path: &Path, config_path: Option<&Path>) -> Result<AnalyticsEngine<Database>> {
    let db = open_db(db_path)?;
    let config = load_config(config_path)?;
    Ok(AnalyticsEngine::with_config(db, config))
}

/// Resolve filter arguments, looking providers up by name
pub fn resolve_filter(db: &Database, args: &FilterArgs) -> Result<StreamFilter> {
    let provider_id = match args.provider.as_deref() {
        Some(name) => Some(db.require_provider(name)?.id),
        None => None,
    };

    Ok(StreamFilter {
        direction: args.direction,
        provider_id,
        stream_id: args.stream,
        category: args.category.clone(),
    })
}

/// Resolve `--from`/`--to` against the engine's notion of today
pub fn resolve_range(
    engine: &AnalyticsEngine<Database>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<DateRange>> {
    DateRange::from_bounds(from, to, engine.today()).context("Invalid date range")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let stats = db.store_stats()?;

    println!(
        "   {} streams, {} snapshots",
        stats.stream_count, stats.snapshot_count
    );
    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Load data: flowcast load --file streams.json");
    println!("  2. Run a report: flowcast report trend");
    println!("  3. Start the API: flowcast serve");

    Ok(())
}

pub fn cmd_load(db: &Database, file: &Path, replace: bool) -> Result<()> {
    println!("📥 Loading {}...", file.display());
    if replace {
        println!("   Replacing existing streams");
    }

    let stats = import::load_file(db, file, replace)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    println!("   Streams:           {}", stats.streams);
    println!("   Snapshots created: {}", stats.snapshots_created);
    println!("   Snapshots updated: {}", stats.snapshots_updated);
    if stats.skipped > 0 {
        println!("   ⚠️  Skipped rows:   {}", stats.skipped);
    }

    let totals = db.store_stats()?;
    if let (Some(first), Some(last)) = (totals.first_snapshot, totals.last_snapshot) {
        println!(
            "   Store now holds {} snapshots from {} to {}",
            totals.snapshot_count, first, last
        );
    }
    println!("✅ Load complete");

    Ok(())
}

pub fn cmd_streams(db: &Database, filter: &StreamFilter, json: bool) -> Result<()> {
    let providers = db.list_providers()?;
    let streams: Vec<StreamSummary> = db
        .list_streams()?
        .iter()
        .filter(|s| filter.matches(s))
        .map(|s| StreamSummary::from_stream(s, &providers))
        .collect();

    if json {
        return print_json(&streams);
    }

    if streams.is_empty() {
        println!("No streams found. Load data with: flowcast load --file <file>");
        return Ok(());
    }

    println!();
    println!(
        "   {:>4} │ {:24} │ {:16} │ {:8} │ {:>5} │ {:>12} │ {:10}",
        "ID", "Name", "Provider", "Dir", "Snaps", "Latest", "Last date"
    );
    println!("   ─────┼──────────────────────────┼──────────────────┼──────────┼───────┼──────────────┼───────────");
    for s in &streams {
        let name = if s.is_fixed {
            format!("{} (fixed)", s.name)
        } else {
            s.name.clone()
        };
        println!(
            "   {:>4} │ {:24} │ {:16} │ {:8} │ {:>5} │ {:>12} │ {:10}",
            s.id,
            truncate(&name, 24),
            truncate(s.provider.as_deref().unwrap_or("-"), 16),
            s.direction.as_str(),
            s.snapshot_count,
            s.latest_usd
                .map(|v| format!("${:.2}", v))
                .unwrap_or_else(|| "-".to_string()),
            s.last_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    println!();
    println!("   {} streams", streams.len());

    Ok(())
}
