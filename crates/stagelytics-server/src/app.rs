use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `CorsLayer`: any origin unless `STAGELYTICS_CORS_ORIGINS` names some.
/// 2. `TraceLayer`: structured request/response logging via `tracing`.
/// 3. `CompressionLayer`: gzip for the larger report bodies.
/// 4. `DefaultBodyLimit`: uploads capped at `max_upload_bytes`.
pub fn build_app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/datasets",
            get(routes::datasets::list_datasets).post(routes::datasets::upload_dataset),
        )
        .route(
            "/api/datasets/{id}",
            get(routes::datasets::get_dataset).delete(routes::datasets::delete_dataset),
        )
        .route("/api/datasets/{id}/stages", get(routes::datasets::list_stages))
        .route(
            "/api/datasets/{id}/countries",
            get(routes::datasets::list_countries),
        )
        .route("/api/datasets/{id}/report", get(routes::report::get_report))
        .route("/api/datasets/{id}/funnel", get(routes::funnel::get_funnel))
        .route(
            "/api/datasets/{id}/first-clear",
            get(routes::first_clear::get_first_clear),
        )
        .route("/api/tutorial", post(routes::tutorial::analyze_tutorial))
        .route(
            "/api/tutorial/steps",
            get(routes::tutorial::list_tutorial_steps),
        )
        .route(
            "/api/tutorial-files",
            get(routes::tutorial::list_tutorial_files),
        )
        .route(
            "/api/tutorial-files/{file_name}",
            get(routes::tutorial::get_tutorial_file),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
