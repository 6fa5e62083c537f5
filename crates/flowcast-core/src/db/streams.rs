//! Stream and snapshot operations, and the stream source read path

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    FixedPeriod, FlowDirection, NewSnapshot, NewStream, Provider, Snapshot, Stream, StreamQuery,
};
use crate::source::StreamSource;

/// Row counts and date coverage of the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub provider_count: i64,
    pub stream_count: i64,
    pub snapshot_count: i64,
    pub first_snapshot: Option<NaiveDate>,
    pub last_snapshot: Option<NaiveDate>,
    pub last_updated: Option<DateTime<Utc>>,
}

const STREAM_COLUMNS: &str =
    "s.id, s.provider_id, s.name, s.category, s.direction, s.is_fixed, s.fixed_period";

fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_stream(row: &Row<'_>) -> rusqlite::Result<Stream> {
    let direction_str: String = row.get(4)?;
    let fixed_period_str: Option<String> = row.get(6)?;

    Ok(Stream {
        id: row.get(0)?,
        provider_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        direction: direction_str.parse().unwrap_or(FlowDirection::Income),
        is_fixed: row.get(5)?,
        fixed_period: fixed_period_str.and_then(|p| p.parse::<FixedPeriod>().ok()),
        snapshots: vec![],
    })
}

impl Database {
    /// Create or get a stream, resolving its provider by name
    ///
    /// Streams are unique by (name, direction). An existing stream keeps its
    /// id; its category, provider, and schedule are updated to the new values.
    pub fn upsert_stream(&self, stream: &NewStream) -> Result<i64> {
        if stream.name.trim().is_empty() {
            return Err(Error::InvalidData("Stream name cannot be empty".into()));
        }

        let provider_id = match stream.provider.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(self.upsert_provider(name)?),
            _ => None,
        };

        let conn = self.conn()?;
        let fixed_period = stream.fixed_period.map(|p| p.as_str());

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM streams WHERE name = ? AND direction = ?",
                params![stream.name.trim(), stream.direction.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            conn.execute(
                "UPDATE streams SET provider_id = ?, category = ?, is_fixed = ?, fixed_period = ? WHERE id = ?",
                params![
                    provider_id,
                    stream.category,
                    stream.is_fixed,
                    fixed_period,
                    id
                ],
            )?;
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO streams (provider_id, name, category, direction, is_fixed, fixed_period) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                provider_id,
                stream.name.trim(),
                stream.category,
                stream.direction.as_str(),
                stream.is_fixed,
                fixed_period
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Insert or replace the snapshot for (stream, date)
    ///
    /// Returns true when a new row was created, false when an existing
    /// snapshot for the same day was updated.
    pub fn upsert_snapshot(&self, stream_id: i64, snapshot: &NewSnapshot) -> Result<bool> {
        let conn = self.conn()?;
        let date = snapshot.date.to_string();

        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM snapshots WHERE stream_id = ? AND date = ?",
                params![stream_id, date],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        conn.execute(
            r#"
            INSERT INTO snapshots (stream_id, date, amount, currency, usd_amount, exchange_rate, rate_source)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (stream_id, date) DO UPDATE SET
                amount = excluded.amount,
                currency = excluded.currency,
                usd_amount = excluded.usd_amount,
                exchange_rate = excluded.exchange_rate,
                rate_source = excluded.rate_source,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![
                stream_id,
                date,
                snapshot.amount,
                snapshot.currency.to_uppercase(),
                snapshot.usd_amount,
                snapshot.exchange_rate,
                snapshot.rate_source
            ],
        )?;

        Ok(!exists)
    }

    /// List streams without their snapshots
    pub fn list_streams(&self) -> Result<Vec<Stream>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM streams s ORDER BY s.name", STREAM_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let streams = stmt
            .query_map([], row_to_stream)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(streams)
    }

    /// Row counts and date coverage
    pub fn store_stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;

        let provider_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM providers", [], |row| row.get(0))?;
        let stream_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM streams", [], |row| row.get(0))?;

        let (snapshot_count, first, last, updated): (
            i64,
            Option<String>,
            Option<String>,
            Option<String>,
        ) = conn.query_row(
            "SELECT COUNT(*), MIN(date), MAX(date), MAX(updated_at) FROM snapshots",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        Ok(StoreStats {
            provider_count,
            stream_count,
            snapshot_count,
            first_snapshot: first.as_deref().map(parse_date).transpose()?,
            last_snapshot: last.as_deref().map(parse_date).transpose()?,
            last_updated: updated.as_deref().map(parse_datetime),
        })
    }

    /// Load streams with all their snapshots in two queries
    fn load_streams(&self, query: &StreamQuery) -> Result<Vec<Stream>> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut query_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(direction) = query.direction {
            conditions.push("s.direction = ?");
            query_params.push(Box::new(direction.as_str()));
        }
        if let Some(provider_id) = query.provider_id {
            conditions.push("s.provider_id = ?");
            query_params.push(Box::new(provider_id));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            query_params.iter().map(|p| p.as_ref()).collect();

        let stream_sql = format!(
            "SELECT {} FROM streams s {} ORDER BY s.id",
            STREAM_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&stream_sql)?;
        let mut streams = stmt
            .query_map(param_refs.as_slice(), row_to_stream)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let snapshot_sql = format!(
            r#"
            SELECT sn.stream_id, sn.date, sn.amount, sn.currency, sn.usd_amount, sn.exchange_rate, sn.rate_source
            FROM snapshots sn
            JOIN streams s ON s.id = sn.stream_id
            {}
            ORDER BY sn.stream_id, sn.date
            "#,
            where_clause
        );
        let mut stmt = conn.prepare(&snapshot_sql)?;
        let snapshots = stmt
            .query_map(param_refs.as_slice(), row_to_snapshot)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut by_stream: HashMap<i64, Vec<Snapshot>> = HashMap::new();
        for snapshot in snapshots {
            by_stream.entry(snapshot.stream_id).or_default().push(snapshot);
        }
        for stream in &mut streams {
            stream.snapshots = by_stream.remove(&stream.id).unwrap_or_default();
        }

        debug!(
            streams = streams.len(),
            direction = ?query.direction,
            provider_id = ?query.provider_id,
            "Loaded streams from store"
        );

        Ok(streams)
    }
}

fn row_to_snapshot(row: &Row<'_>) -> rusqlite::Result<Snapshot> {
    let date_str: String = row.get(1)?;
    Ok(Snapshot {
        stream_id: row.get(0)?,
        date: parse_date(&date_str)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        usd_amount: row.get(4)?,
        exchange_rate: row.get(5)?,
        rate_source: row.get(6)?,
    })
}

/// Store failures reach the engine as source failures, message intact
fn upstream(err: Error) -> Error {
    match err {
        Error::Upstream(_) => err,
        other => Error::Upstream(other.to_string()),
    }
}

impl StreamSource for Database {
    fn fetch_streams(&self, query: &StreamQuery) -> Result<Vec<Stream>> {
        self.load_streams(query).map_err(upstream)
    }

    fn fetch_providers(&self) -> Result<Vec<Provider>> {
        self.list_providers().map_err(upstream)
    }
}
