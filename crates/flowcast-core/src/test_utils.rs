//! Test utilities for flowcast-core
//!
//! Fixture builders for streams and snapshots, a ready-made scenario source,
//! and a source that always fails (for upstream error propagation tests).

use chrono::NaiveDate;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    FixedPeriod, FlowDirection, NewSnapshot, NewStream, Provider, Snapshot, Stream, StreamQuery,
};
use crate::source::{InMemorySource, StreamSource};

/// Parse a `YYYY-MM-DD` literal
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fixture date must be YYYY-MM-DD")
}

/// A USD snapshot for a stream
pub fn snapshot(stream_id: i64, on: &str, usd: f64) -> Snapshot {
    Snapshot {
        stream_id,
        date: date(on),
        amount: usd,
        currency: "USD".to_string(),
        usd_amount: usd,
        exchange_rate: 1.0,
        rate_source: None,
    }
}

/// A snapshot recorded in another currency
pub fn foreign_snapshot(stream_id: i64, on: &str, amount: f64, currency: &str, rate: f64) -> Snapshot {
    Snapshot {
        stream_id,
        date: date(on),
        amount,
        currency: currency.to_string(),
        usd_amount: amount * rate,
        exchange_rate: rate,
        rate_source: Some("fixture".to_string()),
    }
}

/// A variable stream without snapshots
pub fn stream(id: i64, name: &str, direction: FlowDirection) -> Stream {
    Stream {
        id,
        provider_id: None,
        name: name.to_string(),
        category: None,
        direction,
        is_fixed: false,
        fixed_period: None,
        snapshots: vec![],
    }
}

/// A fixed stream with the given schedule
pub fn fixed_stream(id: i64, name: &str, direction: FlowDirection, period: FixedPeriod) -> Stream {
    Stream {
        is_fixed: true,
        fixed_period: Some(period),
        ..stream(id, name, direction)
    }
}

/// Attach snapshots `(date, usd)` to a stream
pub fn with_snapshots(mut stream: Stream, points: &[(&str, f64)]) -> Stream {
    let id = stream.id;
    stream.snapshots = points.iter().map(|(d, v)| snapshot(id, d, *v)).collect();
    stream.snapshots.sort_by_key(|s| s.date);
    stream
}

/// Three $100 incomes and two $40 outcomes in January 2024
pub fn january_scenario() -> InMemorySource {
    let income = with_snapshots(
        stream(1, "Consulting", FlowDirection::Income),
        &[("2024-01-05", 100.0), ("2024-01-15", 100.0), ("2024-01-25", 100.0)],
    );
    let outcome = with_snapshots(
        stream(2, "Hosting", FlowDirection::Outcome),
        &[("2024-01-10", 40.0), ("2024-01-20", 40.0)],
    );
    InMemorySource::new(vec![income, outcome], vec![])
}

/// A mixed household with fixed salary, variable freelance income, and two
/// expense streams across two providers
pub fn household() -> InMemorySource {
    let mut salary = with_snapshots(
        fixed_stream(1, "Salary", FlowDirection::Income, FixedPeriod::Monthly),
        &[
            ("2024-01-31", 3000.0),
            ("2024-02-29", 3000.0),
            ("2024-03-31", 3000.0),
            ("2024-04-30", 3000.0),
        ],
    );
    salary.provider_id = Some(1);
    salary.category = Some("Employment".to_string());

    let mut freelance = with_snapshots(
        stream(2, "Freelance", FlowDirection::Income),
        &[
            ("2024-01-12", 800.0),
            ("2024-02-14", 1000.0),
            ("2024-03-11", 900.0),
            ("2024-04-16", 1100.0),
        ],
    );
    freelance.provider_id = Some(2);
    freelance.category = Some("Contracting".to_string());

    let mut rent = with_snapshots(
        fixed_stream(3, "Rent", FlowDirection::Outcome, FixedPeriod::Monthly),
        &[
            ("2024-01-01", 1500.0),
            ("2024-02-01", 1500.0),
            ("2024-03-01", 1500.0),
            ("2024-04-01", 1500.0),
        ],
    );
    rent.provider_id = Some(1);
    rent.category = Some("Housing".to_string());

    let mut groceries = with_snapshots(
        stream(4, "Groceries", FlowDirection::Outcome),
        &[
            ("2024-01-06", 120.0),
            ("2024-01-20", 140.0),
            ("2024-02-03", 110.0),
            ("2024-03-09", 160.0),
            ("2024-04-13", 150.0),
        ],
    );
    groceries.category = Some("Food".to_string());

    InMemorySource::new(
        vec![salary, freelance, rent, groceries],
        vec![
            Provider {
                id: 1,
                name: "Acme Corp".to_string(),
            },
            Provider {
                id: 2,
                name: "Upwork".to_string(),
            },
        ],
    )
}

/// Write every stream of an in-memory source into a store
pub fn seed_database(db: &Database, source: &InMemorySource) -> Result<()> {
    let providers = source.fetch_providers()?;
    for stream in source.streams() {
        let provider = stream
            .provider_id
            .and_then(|id| providers.iter().find(|p| p.id == id))
            .map(|p| p.name.clone());
        let stream_id = db.upsert_stream(&NewStream {
            provider,
            name: stream.name.clone(),
            category: stream.category.clone(),
            direction: stream.direction,
            is_fixed: stream.is_fixed,
            fixed_period: stream.fixed_period,
        })?;
        for snap in &stream.snapshots {
            db.upsert_snapshot(
                stream_id,
                &NewSnapshot {
                    date: snap.date,
                    amount: snap.amount,
                    currency: snap.currency.clone(),
                    usd_amount: snap.usd_amount,
                    exchange_rate: snap.exchange_rate,
                    rate_source: snap.rate_source.clone(),
                },
            )?;
        }
    }
    Ok(())
}

/// An in-memory store holding the [`household`] scenario
pub fn household_database() -> Database {
    let db = Database::in_memory().expect("in-memory store");
    seed_database(&db, &household()).expect("seed household");
    db
}

/// A stream source whose every call fails
#[derive(Debug, Default)]
pub struct FailingSource;

impl StreamSource for FailingSource {
    fn fetch_streams(&self, _query: &StreamQuery) -> Result<Vec<Stream>> {
        Err(Error::Upstream("stream store unavailable".to_string()))
    }

    fn fetch_providers(&self) -> Result<Vec<Provider>> {
        Err(Error::Upstream("stream store unavailable".to_string()))
    }
}
