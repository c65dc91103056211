//! HTTP server lifecycle.

use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::{self, AppState};
use crate::config::AppConfig;
use crate::error::Result;
use crate::store::Store;

/// Connect the store, bind the configured port, and serve the API until
/// interrupted.
pub async fn run(config: AppConfig) -> Result<()> {
    // The sync postgres client cannot be driven from a runtime worker
    // thread; connect on the blocking pool.
    let database = config.database.clone();
    let store = tokio::task::spawn_blocking(move || Store::connect(&database))
        .await
        .map_err(|e| crate::Error::Store(format!("store startup task failed: {e}")))??;

    let state = Arc::new(AppState {
        config: config.api.clone(),
        store,
    });

    // Every request gets its own span carrying a request id, so all handler
    // logs for one request correlate.
    let app = api::router(state).layer(TraceLayer::new_for_http().make_span_with(
        |request: &axum::http::Request<axum::body::Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %Uuid::new_v4(),
            )
        },
    ));

    let addr = format!("0.0.0.0:{}", config.api.http_server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("serving HTTP API at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server exited properly");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received, draining connections"),
        Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
    }
}
