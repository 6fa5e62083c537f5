//! Stream analytics
//!
//! Stateless components (period resolution, grouping, statistics, forecast,
//! simulation, aggregation) composed by [`AnalyticsEngine`].

pub mod aggregators;
pub mod cancel;
pub mod engine;
pub mod forecast;
pub mod grouping;
pub mod monte_carlo;
pub mod periods;
pub mod rng;
pub mod stats;
pub mod types;

pub use cancel::CancelToken;
pub use engine::{AnalyticsEngine, MonteCarloParams, TrendParams};
pub use forecast::ForecastInputs;
pub use grouping::{Bucket, FlowRecord};
pub use periods::{resolve_periods, PeriodBounds, PeriodMode};
pub use rng::{RandomSource, SeededRandom};
pub use types::*;
