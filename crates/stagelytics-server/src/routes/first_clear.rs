use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use stagelytics_core::analytics::FirstClearStageData;
use stagelytics_core::filter::apply_filters;
use stagelytics_core::first_clear::{
    first_clear_all_stages, first_clear_by_try_count, first_clear_summary,
};

use crate::{
    error::AppError,
    routes::query::{FilterParams, StageParams},
    state::AppState,
};

fn with_summary(data: FirstClearStageData) -> Value {
    let summary = first_clear_summary(&data);
    json!({ "distribution": data, "summary": summary })
}

/// `GET /api/datasets/{id}/first-clear`: attempts-to-first-clear
/// distribution for one stage, or for every stage with a first clear.
#[tracing::instrument(skip(state))]
pub async fn get_first_clear(
    State(state): State<Arc<AppState>>,
    Path(dataset_id): Path<String>,
    Query(params): Query<FilterParams>,
    Query(stage): Query<StageParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.to_filter()?;
    let dataset = state.dataset(&dataset_id).await?;
    let events = apply_filters(&dataset.events, &filter);

    let data = match stage.stage_id() {
        Some(id) => with_summary(first_clear_by_try_count(&events, id)),
        None => Value::Array(
            first_clear_all_stages(&events)
                .into_iter()
                .map(with_summary)
                .collect(),
        ),
    };
    Ok(Json(json!({ "data": data })))
}
