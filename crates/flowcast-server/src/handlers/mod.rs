//! HTTP request handlers
//!
//! Engine and store calls are synchronous, so every handler hands its work
//! to the blocking pool through [`run_engine`].

pub mod reports;
pub mod streams;

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tokio::task;

use flowcast_core::models::{FlowDirection, StreamFilter};
use flowcast_core::{AnalyticsEngine, Database};

use crate::{AppError, AppState};

pub use reports::*;
pub use streams::*;

/// Run a synchronous engine call on the blocking pool
pub(crate) async fn run_engine<T, F>(state: Arc<AppState>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&AnalyticsEngine<Database>) -> flowcast_core::Result<T> + Send + 'static,
{
    let value = task::spawn_blocking(move || f(&state.engine))
        .await
        .map_err(|e| anyhow::anyhow!("Engine task failed: {}", e))??;
    Ok(value)
}

/// Stream filters shared by most endpoints
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub direction: Option<String>,
    pub provider_id: Option<i64>,
    pub stream_id: Option<i64>,
    pub category: Option<String>,
}

impl FilterQuery {
    pub fn direction(&self) -> Result<Option<FlowDirection>, AppError> {
        self.direction
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<FlowDirection>)
            .transpose()
            .map_err(|e| AppError::bad_request(&e))
    }

    pub fn into_filter(self) -> Result<StreamFilter, AppError> {
        Ok(StreamFilter {
            direction: self.direction()?,
            provider_id: self.provider_id,
            stream_id: self.stream_id,
            category: self.category.filter(|c| !c.trim().is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub today: chrono::NaiveDate,
}

/// GET /api/health - Liveness probe (no auth)
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        today: state.engine.today(),
    })
}
