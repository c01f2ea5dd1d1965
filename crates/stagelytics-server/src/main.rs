use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use stagelytics_server::{config::Config, state::AppState};

/// `stagelytics health`: liveness probe for container health checks.
///
/// Calls `GET http://localhost:$STAGELYTICS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("STAGELYTICS_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stagelytics=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    if !cfg.tutorial_dir.is_dir() {
        tracing::warn!(
            tutorial_dir = %cfg.tutorial_dir.display(),
            "Tutorial data directory not found; /api/tutorial-files will list nothing"
        );
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    info!(
        port = cfg.port,
        max_datasets = cfg.max_datasets,
        max_upload_bytes = cfg.max_upload_bytes,
        "Stagelytics listening on {}",
        addr
    );

    let state = Arc::new(AppState::new(cfg));
    let app = stagelytics_server::app::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("Stagelytics stopped");
    Ok(())
}
