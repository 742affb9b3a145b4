//! HTTP surface for the presentation layer
//!
//! Serves the display state, a health check and Prometheus metrics.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::error::Result;
use crate::render::MetricsSurface;
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/display", get(display))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        // The browser UI is served from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `cancel` fires
pub async fn serve(state: Arc<AppState>, cancel: CancellationToken) -> Result<()> {
    let addr = state.config.http_addr;
    info!(addr = %addr, "Starting HTTP server");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let status = state.display.read().await.status;
    Json(serde_json::json!({
        "status": "healthy",
        "component": "book-feed-monitor",
        "connectionStatus": status,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn display(State(state): State<Arc<AppState>>) -> Json<MetricsSurface> {
    Json(state.display.read().await.surface())
}

async fn metrics(State(state): State<Arc<AppState>>) -> std::result::Result<String, (StatusCode, String)> {
    state
        .telemetry
        .encode()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
