//! Order book feed monitor
//!
//! Connects to the feed stream, keeps throttled display state with latency
//! and throughput metrics, and serves it over HTTP to the browser UI.

use std::sync::Arc;

use book_feed_monitor::render::periodic;
use book_feed_monitor::{http, AppState, Config, Engine, FeedTelemetry};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting order book feed monitor");

    let config = Arc::new(Config::load()?);
    info!(
        url = %config.stream_url,
        http_addr = %config.http_addr,
        "Configuration loaded"
    );

    let telemetry = FeedTelemetry::new()?;
    let engine = Engine::new(config.clone(), telemetry.clone());

    let state = Arc::new(AppState {
        display: engine.display(),
        telemetry,
        config,
    });
    let shutdown = CancellationToken::new();

    let http_state = state.clone();
    let http_cancel = shutdown.clone();
    let http_task = tokio::spawn(async move {
        if let Err(e) = http::serve(http_state, http_cancel).await {
            warn!(error = %e, "HTTP server error");
        }
    });

    let status_task = tokio::spawn(log_status(state.clone(), shutdown.clone()));

    let mut engine = engine.spawn();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    engine.shutdown().await;
    shutdown.cancel();
    if let Err(e) = http_task.await {
        warn!(error = %e, "HTTP server task ended abnormally");
    }
    if let Err(e) = status_task.await {
        warn!(error = %e, "Status log task ended abnormally");
    }

    info!("Feed monitor stopped");
    Ok(())
}

/// Periodically log what the UI is currently showing
async fn log_status(state: Arc<AppState>, cancel: CancellationToken) {
    let mut ticker = periodic(state.config.status_log_interval());
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let shown = state.display.read().await;
                let best_bid = shown
                    .snapshot
                    .as_ref()
                    .and_then(|s| s.bids.first())
                    .map(|l| l.price);
                let best_ask = shown
                    .snapshot
                    .as_ref()
                    .and_then(|s| s.asks.first())
                    .map(|l| l.price);
                info!(
                    status = %shown.status,
                    latency = %shown.latency,
                    throughput_hz = shown.throughput_hz,
                    best_bid = ?best_bid,
                    best_ask = ?best_ask,
                    "Feed status"
                );
            }
        }
    }
}
