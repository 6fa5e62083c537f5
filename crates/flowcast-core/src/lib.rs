//! Flowcast Core Library
//!
//! Shared functionality for the Flowcast stream analytics engine:
//! - Domain models for streams, snapshots, and report parameters
//! - The [`StreamSource`] contract and its SQLite and in-memory implementations
//! - Dataset loading (JSON datasets and snapshot CSV)
//! - Engine configuration with an embedded default and file override
//! - The analytics engine: period comparison, trends, distribution,
//!   seasonality, forecasting, and Monte Carlo simulation

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod source;

/// Test utilities: fixture streams and scenario sources
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analytics::{AnalyticsEngine, CancelToken, MonteCarloParams, TrendParams};
pub use config::EngineConfig;
pub use db::{Database, StoreStats};
pub use error::{Error, Result};
pub use import::{Dataset, DatasetStream, LoadStats};
pub use source::{InMemorySource, StreamSource};
