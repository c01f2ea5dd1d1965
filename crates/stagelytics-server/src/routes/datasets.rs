use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use stagelytics_core::ingest::normalize_rows;
use stagelytics_core::stage::{format_stage_id, stage_ids, StageType};
use stagelytics_core::stats::available_countries;
use stagelytics_core::store::Dataset;

use crate::{error::AppError, state::AppState, upload::read_csv};

/// `POST /api/datasets`: upload a stage event log as CSV.
///
/// The whole body must normalise; one bad row rejects the upload with the
/// row number in the message.
#[tracing::instrument(skip(state, body))]
pub async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::BadRequest("request body is empty".to_string()));
    }

    let raw = body.clone();
    let events = tokio::task::spawn_blocking(move || {
        let rows = read_csv(&raw[..])?;
        normalize_rows(&rows)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    let summary = state.store_dataset(Dataset::new(&body, events)).await?;
    tracing::info!(
        dataset_id = %summary.dataset_id,
        events = summary.event_count,
        "dataset uploaded"
    );
    Ok((StatusCode::CREATED, Json(json!({ "data": summary }))))
}

/// `GET /api/datasets`: summaries of every held dataset, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list_datasets(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let datasets = state.datasets.list().await?;
    Ok(Json(json!({ "data": datasets })))
}

/// `GET /api/datasets/{id}`
#[tracing::instrument(skip(state))]
pub async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path(dataset_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let dataset = state.dataset(&dataset_id).await?;
    Ok(Json(json!({ "data": dataset.summary() })))
}

/// `DELETE /api/datasets/{id}`
#[tracing::instrument(skip(state))]
pub async fn delete_dataset(
    State(state): State<Arc<AppState>>,
    Path(dataset_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.datasets.remove(&dataset_id).await? {
        return Err(AppError::NotFound("Dataset not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/datasets/{id}/stages`: stage ids in numeric order with labels.
#[tracing::instrument(skip(state))]
pub async fn list_stages(
    State(state): State<Arc<AppState>>,
    Path(dataset_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let dataset = state.dataset(&dataset_id).await?;
    let stages: Vec<_> = stage_ids(&dataset.events)
        .into_iter()
        .map(|id| {
            json!({
                "stage_type": StageType::of(&id),
                "label": format_stage_id(&id),
                "stage_id": id,
            })
        })
        .collect();
    Ok(Json(json!({ "data": stages })))
}

/// `GET /api/datasets/{id}/countries`: options for the country filter.
#[tracing::instrument(skip(state))]
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
    Path(dataset_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let dataset = state.dataset(&dataset_id).await?;
    Ok(Json(json!({ "data": available_countries(&dataset.events) })))
}
