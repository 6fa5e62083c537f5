//! Stream listing handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use flowcast_core::models::StreamSummary;

use super::{run_engine, FilterQuery};
use crate::{AppError, AppState};

/// GET /api/streams - List streams matching the filters
pub async fn list_streams(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<Vec<StreamSummary>>, AppError> {
    let filter = filter.into_filter()?;

    let streams = run_engine(state, move |engine| {
        let db = engine.source();
        let providers = db.list_providers()?;
        Ok(db
            .list_streams()?
            .iter()
            .filter(|s| filter.matches(s))
            .map(|s| StreamSummary::from_stream(s, &providers))
            .collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(streams))
}
