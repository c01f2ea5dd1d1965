use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /health`: liveness check.
///
/// Response shape:
/// ```json
/// { "status": "ok", "version": "0.1.0", "datasets": 2 }
/// ```
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let datasets = match state.datasets.list().await {
        Ok(list) => list.len(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: dataset store unavailable");
            0
        }
    };
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "datasets": datasets
    }))
}
