use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use stagelytics_core::filter::apply_filters;
use stagelytics_core::funnel::{funnel, funnel_summary, stage_funnel};

use crate::{
    error::AppError,
    routes::query::{FilterParams, StageParams},
    state::AppState,
};

/// `GET /api/datasets/{id}/funnel`: level funnel over the filtered events,
/// narrowed to one stage when `stage_id` is given.
#[tracing::instrument(skip(state))]
pub async fn get_funnel(
    State(state): State<Arc<AppState>>,
    Path(dataset_id): Path<String>,
    Query(params): Query<FilterParams>,
    Query(stage): Query<StageParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.to_filter()?;
    let dataset = state.dataset(&dataset_id).await?;
    let events = apply_filters(&dataset.events, &filter);

    let levels = match stage.stage_id() {
        Some(id) => stage_funnel(&events, id),
        None => funnel(&events),
    };
    let summary = funnel_summary(&levels);
    Ok(Json(json!({
        "data": {
            "stage_id": stage.stage_id(),
            "levels": levels,
            "summary": summary
        }
    })))
}
