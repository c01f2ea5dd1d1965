use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use stagelytics_core::report::DashboardReport;

use crate::{error::AppError, routes::query::FilterParams, state::AppState};

/// `GET /api/datasets/{id}/report`: every dashboard aggregate for the
/// filtered view of one dataset.
#[tracing::instrument(skip(state))]
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(dataset_id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.to_filter()?;
    let dataset = state.dataset(&dataset_id).await?;
    let report = tokio::task::spawn_blocking(move || {
        DashboardReport::build(&dataset.events, &filter)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(json!({ "data": report })))
}
