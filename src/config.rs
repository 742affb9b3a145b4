//! Configuration module for the feed monitor

use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{MonitorError, Result};
use crate::metrics::DEFAULT_SKEW_PLACEHOLDER_MAX_MS;
use crate::stream::normalize_stream_url;

pub const DEFAULT_STREAM_URL: &str = "ws://127.0.0.1:8080/stream";
const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:9090";

/// Largest accepted stream-to-engine channel capacity
pub const MAX_EVENT_BUFFER: usize = 1 << 20;

/// Largest accepted skew placeholder; keeps substituted latencies below 3ms
pub const MAX_SKEW_PLACEHOLDER_MS: u64 = 2;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Normalized websocket endpoint of the feed service
    pub stream_url: String,

    /// Display refresh cadence
    pub render_interval_ms: u64,

    /// Throughput sampling window
    pub throughput_window_ms: u64,

    /// Upper bound of the negative-latency placeholder
    pub skew_placeholder_max_ms: u64,

    /// Ingest time above which a frame is logged as slow
    pub slow_ingest_warn_us: u64,

    /// Capacity of the stream-to-engine event channel
    pub event_buffer: usize,

    /// Bind address of the HTTP surface
    pub http_addr: SocketAddr,

    /// Status log interval in seconds
    pub status_log_interval_secs: u64,
}

impl Config {
    /// Load configuration from `.env` and environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let stream_url = normalize_stream_url(
            &lookup("STREAM_URL").unwrap_or_else(|| DEFAULT_STREAM_URL.to_string()),
        )
        .map_err(|e| MonitorError::ConfigError(e.to_string()))?;

        let http_addr = lookup("HTTP_ADDR")
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string())
            .parse()
            .map_err(|e| MonitorError::ConfigError(format!("HTTP_ADDR: {e}")))?;

        let event_buffer = usize::try_from(number("EVENT_BUFFER", 4096))
            .map_err(|e| MonitorError::ConfigError(format!("EVENT_BUFFER: {e}")))?;

        let config = Self {
            stream_url,
            render_interval_ms: number("RENDER_INTERVAL_MS", 100),
            throughput_window_ms: number("THROUGHPUT_WINDOW_MS", 1000),
            skew_placeholder_max_ms: number(
                "SKEW_PLACEHOLDER_MAX_MS",
                DEFAULT_SKEW_PLACEHOLDER_MAX_MS,
            ),
            slow_ingest_warn_us: number("SLOW_INGEST_WARN_US", 100),
            event_buffer,
            http_addr,
            status_log_interval_secs: number("STATUS_LOG_INTERVAL_SECS", 30),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.render_interval_ms == 0 {
            return Err(MonitorError::ConfigError(
                "RENDER_INTERVAL_MS must be positive".to_string(),
            ));
        }
        if self.throughput_window_ms == 0 {
            return Err(MonitorError::ConfigError(
                "THROUGHPUT_WINDOW_MS must be positive".to_string(),
            ));
        }
        if self.event_buffer == 0 || self.event_buffer > MAX_EVENT_BUFFER {
            return Err(MonitorError::ConfigError(format!(
                "EVENT_BUFFER must be between 1 and {MAX_EVENT_BUFFER}"
            )));
        }
        if self.skew_placeholder_max_ms > MAX_SKEW_PLACEHOLDER_MS {
            return Err(MonitorError::ConfigError(format!(
                "SKEW_PLACEHOLDER_MAX_MS must be at most {MAX_SKEW_PLACEHOLDER_MS}"
            )));
        }
        if self.status_log_interval_secs == 0 {
            return Err(MonitorError::ConfigError(
                "STATUS_LOG_INTERVAL_SECS must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn throughput_window(&self) -> Duration {
        Duration::from_millis(self.throughput_window_ms)
    }

    pub fn status_log_interval(&self) -> Duration {
        Duration::from_secs(self.status_log_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream_url: DEFAULT_STREAM_URL.to_string(),
            render_interval_ms: 100,
            throughput_window_ms: 1000,
            skew_placeholder_max_ms: DEFAULT_SKEW_PLACEHOLDER_MAX_MS,
            slow_ingest_warn_us: 100,
            event_buffer: 4096,
            http_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            status_log_interval_secs: 30,
        }
    }
}
