//! Dataset loading
//!
//! Two input formats, both carrying already-classified, already-converted
//! rows:
//! - JSON datasets: `{ "streams": [{ name, direction, ..., snapshots: [...] }] }`
//! - Snapshot CSV: one snapshot per row with the owning stream's attributes
//!
//! Rows that cannot be used are skipped with a warning; structural problems
//! (unreadable file, malformed JSON, missing CSV columns) are errors.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    FixedPeriod, FlowDirection, NewSnapshot, NewStream, Provider, Snapshot, Stream,
};
use crate::source::InMemorySource;

/// A stream and its snapshots as they appear in a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStream {
    #[serde(flatten)]
    pub stream: NewStream,
    #[serde(default)]
    pub snapshots: Vec<NewSnapshot>,
}

/// A complete dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub streams: Vec<DatasetStream>,
}

/// Outcome of loading a dataset into the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub streams: usize,
    pub snapshots_created: usize,
    pub snapshots_updated: usize,
    pub skipped: usize,
}

impl Dataset {
    pub fn snapshot_count(&self) -> usize {
        self.streams.iter().map(|s| s.snapshots.len()).sum()
    }

    /// Build an in-memory source with sequential ids
    ///
    /// Providers are numbered in order of first appearance; streams sharing
    /// a name and direction are merged, later snapshots replacing earlier
    /// ones on the same day.
    pub fn to_source(&self) -> InMemorySource {
        let mut providers: Vec<Provider> = Vec::new();
        let mut streams: Vec<Stream> = Vec::new();

        for entry in &self.streams {
            let new = &entry.stream;
            let name = new.name.trim();
            if name.is_empty() {
                continue;
            }

            let provider_id = new
                .provider
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    match providers.iter().find(|x| x.name.eq_ignore_ascii_case(p)) {
                        Some(existing) => existing.id,
                        None => {
                            let id = providers.len() as i64 + 1;
                            providers.push(Provider {
                                id,
                                name: p.to_string(),
                            });
                            id
                        }
                    }
                });

            let existing = streams
                .iter()
                .position(|s| s.name == name && s.direction == new.direction);
            let index = match existing {
                Some(i) => i,
                None => {
                    streams.push(Stream {
                        id: streams.len() as i64 + 1,
                        provider_id: None,
                        name: name.to_string(),
                        category: None,
                        direction: new.direction,
                        is_fixed: false,
                        fixed_period: None,
                        snapshots: vec![],
                    });
                    streams.len() - 1
                }
            };

            let stream = &mut streams[index];
            stream.provider_id = provider_id;
            stream.category = new.category.clone();
            stream.is_fixed = new.is_fixed;
            stream.fixed_period = new.fixed_period;

            for snap in entry.snapshots.iter().filter(|s| snapshot_is_usable(s)) {
                stream.snapshots.retain(|existing| existing.date != snap.date);
                stream.snapshots.push(Snapshot {
                    stream_id: stream.id,
                    date: snap.date,
                    amount: snap.amount,
                    currency: snap.currency.to_uppercase(),
                    usd_amount: snap.usd_amount,
                    exchange_rate: snap.exchange_rate,
                    rate_source: snap.rate_source.clone(),
                });
            }
        }

        InMemorySource::new(streams, providers)
    }
}

fn snapshot_is_usable(snapshot: &NewSnapshot) -> bool {
    snapshot.amount.is_finite() && snapshot.usd_amount.is_finite()
}

/// Parse a JSON dataset
pub fn parse_dataset<R: Read>(reader: R) -> Result<Dataset> {
    Ok(serde_json::from_reader(reader)?)
}

/// One row of the snapshot CSV format
#[derive(Debug, Deserialize)]
struct CsvRow {
    stream: String,
    direction: String,
    date: String,
    amount: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    usd_amount: Option<f64>,
    #[serde(default)]
    exchange_rate: Option<f64>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    is_fixed: Option<bool>,
    #[serde(default)]
    fixed_period: Option<String>,
    #[serde(default)]
    rate_source: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CsvRow {
    /// Validate and split into stream attributes and a snapshot
    fn into_parts(self) -> std::result::Result<(NewStream, NewSnapshot), String> {
        let name = self.stream.trim().to_string();
        if name.is_empty() {
            return Err("empty stream name".into());
        }
        let direction: FlowDirection = self.direction.trim().parse()?;
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{}': {}", self.date, e))?;
        let fixed_period = match non_empty(self.fixed_period) {
            Some(p) => Some(p.parse::<FixedPeriod>()?),
            None => None,
        };

        let currency = non_empty(self.currency)
            .unwrap_or_else(|| "USD".to_string())
            .to_uppercase();
        // A USD amount is required unless the row is already in USD
        let usd_amount = match self.usd_amount {
            Some(usd) => usd,
            None if currency == "USD" => self.amount,
            None => return Err(format!("missing usd_amount for {} row", currency)),
        };
        if !self.amount.is_finite() || !usd_amount.is_finite() {
            return Err("non-finite amount".into());
        }

        Ok((
            NewStream {
                provider: non_empty(self.provider),
                name,
                category: non_empty(self.category),
                direction,
                is_fixed: self.is_fixed.unwrap_or(fixed_period.is_some()),
                fixed_period,
            },
            NewSnapshot {
                date,
                amount: self.amount,
                currency,
                usd_amount,
                exchange_rate: self.exchange_rate.unwrap_or(1.0),
                rate_source: non_empty(self.rate_source),
            },
        ))
    }
}

/// Parse the snapshot CSV format into a dataset
///
/// Returns the dataset and the number of skipped rows. Rows are grouped into
/// streams by (name, direction); the last row's stream attributes win.
pub fn parse_snapshot_csv<R: Read>(reader: R) -> Result<(Dataset, usize)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for required in ["stream", "direction", "date", "amount"] {
        if !headers.iter().any(|h| h == required) {
            return Err(Error::Import(format!("Missing CSV column: {}", required)));
        }
    }

    let mut grouped: BTreeMap<(String, &'static str), DatasetStream> = BTreeMap::new();
    let mut skipped = 0;

    for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
        // Header is line 1
        let line = line + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(line, error = %e, "Skipping unreadable CSV row");
                skipped += 1;
                continue;
            }
        };

        match row.into_parts() {
            Ok((stream, snapshot)) => {
                let key = (stream.name.clone(), stream.direction.as_str());
                let entry = grouped.entry(key).or_insert_with(|| DatasetStream {
                    stream: stream.clone(),
                    snapshots: vec![],
                });
                entry.stream = stream;
                entry.snapshots.push(snapshot);
            }
            Err(reason) => {
                warn!(line, reason = %reason, "Skipping invalid CSV row");
                skipped += 1;
            }
        }
    }

    Ok((
        Dataset {
            streams: grouped.into_values().collect(),
        },
        skipped,
    ))
}

/// Write a dataset into the store
pub fn load_dataset(db: &Database, dataset: &Dataset) -> Result<LoadStats> {
    let mut stats = LoadStats::default();

    for entry in &dataset.streams {
        let stream_id = match db.upsert_stream(&entry.stream) {
            Ok(id) => id,
            Err(Error::InvalidData(reason)) => {
                warn!(reason = %reason, "Skipping invalid stream");
                stats.skipped += entry.snapshots.len().max(1);
                continue;
            }
            Err(e) => return Err(e),
        };
        stats.streams += 1;

        for snapshot in &entry.snapshots {
            if !snapshot_is_usable(snapshot) {
                warn!(stream = %entry.stream.name, date = %snapshot.date, "Skipping non-finite snapshot");
                stats.skipped += 1;
                continue;
            }
            if db.upsert_snapshot(stream_id, snapshot)? {
                stats.snapshots_created += 1;
            } else {
                stats.snapshots_updated += 1;
            }
        }
    }

    info!(
        streams = stats.streams,
        created = stats.snapshots_created,
        updated = stats.snapshots_updated,
        skipped = stats.skipped,
        "Loaded dataset"
    );

    Ok(stats)
}

/// Read a dataset file, choosing the format by extension
pub fn read_dataset_file(path: &Path) -> Result<(Dataset, usize)> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    let file = File::open(path)?;

    match extension.as_deref() {
        Some("json") => Ok((parse_dataset(file)?, 0)),
        Some("csv") => parse_snapshot_csv(file),
        _ => Err(Error::Import(format!(
            "Unsupported dataset file: {} (expected .json or .csv)",
            path.display()
        ))),
    }
}

/// Read a dataset file and write it into the store
///
/// With `replace`, existing streams and snapshots are cleared once the file
/// has parsed, so a bad file leaves the store untouched.
pub fn load_file(db: &Database, path: &Path, replace: bool) -> Result<LoadStats> {
    let (dataset, skipped) = read_dataset_file(path)?;
    if replace {
        db.clear_streams()?;
    }
    let mut stats = load_dataset(db, &dataset)?;
    stats.skipped += skipped;
    Ok(stats)
}
