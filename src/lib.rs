//! Order book feed monitor library
//!
//! Consumes a streaming order book feed and turns it into display state at a
//! bounded refresh rate, together with per-frame latency and per-second
//! throughput metrics.

use std::sync::Arc;

pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod http;
pub mod metrics;
pub mod render;
pub mod stream;

pub use config::Config;
pub use decoder::{Level, OrderBookSnapshot};
pub use engine::{Engine, EngineHandle, Pipeline};
pub use error::{DecodeError, MonitorError, Result};
pub use metrics::{Clock, FeedTelemetry, LatencyEstimate, LatencyEstimator, SystemClock, ThroughputCounter};
pub use render::{ConnectionStatus, DisplayState, MetricsSurface, SharedDisplay};
pub use stream::{Frame, StreamEvent, StreamHandle};

/// Application state shared with the HTTP surface
pub struct AppState {
    pub display: SharedDisplay,
    pub telemetry: FeedTelemetry,
    pub config: Arc<Config>,
}
