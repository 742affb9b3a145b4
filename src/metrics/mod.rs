//! Metrics module
//!
//! Latency estimation, throughput counting and Prometheus telemetry for the
//! ingestion path.

mod latency;
mod telemetry;
mod throughput;

pub use latency::{LatencyEstimate, LatencyEstimator, DEFAULT_SKEW_PLACEHOLDER_MAX_MS};
pub use telemetry::FeedTelemetry;
pub use throughput::ThroughputCounter;

/// Wall-clock source for receive timestamps
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;
}

/// Clock backed by the system UTC time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
