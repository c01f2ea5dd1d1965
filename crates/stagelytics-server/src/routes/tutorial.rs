use std::io::ErrorKind;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use stagelytics_core::tutorial::catalog::all_steps;
use stagelytics_core::tutorial::{
    dedupe_user_steps, list_data_files, parse_data_file_name, parse_tutorial_rows,
    KeepOccurrence, TutorialReport,
};

use crate::{error::AppError, routes::query::DedupeParams, state::AppState, upload::read_csv};

fn build_report(body: &[u8], keep: Option<KeepOccurrence>) -> Result<TutorialReport, AppError> {
    let rows = read_csv(body)?;
    let mut events = parse_tutorial_rows(&rows);
    if let Some(keep) = keep {
        events = dedupe_user_steps(&events, keep);
    }
    Ok(TutorialReport::build(&events))
}

async fn report_blocking(
    body: Bytes,
    keep: Option<KeepOccurrence>,
) -> Result<TutorialReport, AppError> {
    tokio::task::spawn_blocking(move || build_report(&body, keep))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
}

/// `POST /api/tutorial`: tutorial report for an uploaded CSV.
///
/// `?dedupe=first|last` collapses repeat visits of a step by the same user
/// before counting.
#[tracing::instrument(skip(body))]
pub async fn analyze_tutorial(
    Query(params): Query<DedupeParams>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body?;
    let keep = params.keep()?;
    let report = report_blocking(body, keep).await?;
    Ok(Json(json!({ "data": report })))
}

/// `GET /api/tutorial-files`: data files in the configured directory,
/// newest period first. A missing directory lists nothing.
#[tracing::instrument(skip(state))]
pub async fn list_tutorial_files(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let dir = &state.config.tutorial_dir;
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "tutorial data directory missing");
            return Ok(Json(json!({ "data": [] })));
        }
        Err(e) => return Err(AppError::Internal(e.into())),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::Internal(e.into()))?
    {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
            names.push(name.to_string());
        }
    }
    Ok(Json(json!({ "data": list_data_files(names) })))
}

/// `GET /api/tutorial-files/{file_name}`: tutorial report for one data file.
///
/// The name must match the data-file pattern before the filesystem is
/// touched, so only plain file names inside the directory are reachable.
#[tracing::instrument(skip(state))]
pub async fn get_tutorial_file(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
    Query(params): Query<DedupeParams>,
) -> Result<impl IntoResponse, AppError> {
    let info = parse_data_file_name(&file_name)?;
    let keep = params.keep()?;

    let path = state.config.tutorial_dir.join(&info.file_name);
    let body = match tokio::fs::read(&path).await {
        Ok(body) => body,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "no tutorial data file named '{file_name}'"
            )));
        }
        Err(e) => return Err(AppError::Internal(e.into())),
    };

    let report = report_blocking(Bytes::from(body), keep).await?;
    Ok(Json(json!({ "data": { "file": info, "report": report } })))
}

/// `GET /api/tutorial/steps`: the step catalog with descriptions.
#[tracing::instrument]
pub async fn list_tutorial_steps() -> impl IntoResponse {
    Json(json!({ "data": all_steps() }))
}
