//! Stream source contract
//!
//! The analytics engine reads everything it needs through [`StreamSource`]:
//! all streams (optionally filtered by direction and provider) with their
//! full snapshot history, plus provider display names. The SQLite
//! [`Database`](crate::db::Database) implements it for the CLI and server;
//! [`InMemorySource`] backs tests and ad-hoc JSON datasets.

use crate::error::Result;
use crate::models::{Provider, Stream, StreamQuery};

/// Read-only access to streams and providers
pub trait StreamSource: Send + Sync {
    /// Fetch all streams matching the query, snapshots ordered by date
    fn fetch_streams(&self, query: &StreamQuery) -> Result<Vec<Stream>>;

    /// Fetch all providers (for display names)
    fn fetch_providers(&self) -> Result<Vec<Provider>>;
}

impl<S: StreamSource + ?Sized> StreamSource for std::sync::Arc<S> {
    fn fetch_streams(&self, query: &StreamQuery) -> Result<Vec<Stream>> {
        (**self).fetch_streams(query)
    }

    fn fetch_providers(&self) -> Result<Vec<Provider>> {
        (**self).fetch_providers()
    }
}

/// A fixed set of streams held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    streams: Vec<Stream>,
    providers: Vec<Provider>,
}

impl InMemorySource {
    pub fn new(mut streams: Vec<Stream>, providers: Vec<Provider>) -> Self {
        for stream in &mut streams {
            stream.snapshots.sort_by_key(|s| s.date);
        }
        Self { streams, providers }
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }
}

impl StreamSource for InMemorySource {
    fn fetch_streams(&self, query: &StreamQuery) -> Result<Vec<Stream>> {
        Ok(self
            .streams
            .iter()
            .filter(|s| query.direction.map_or(true, |d| s.direction == d))
            .filter(|s| {
                query
                    .provider_id
                    .map_or(true, |p| s.provider_id == Some(p))
            })
            .cloned()
            .collect())
    }

    fn fetch_providers(&self) -> Result<Vec<Provider>> {
        Ok(self.providers.clone())
    }
}
