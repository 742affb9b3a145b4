//! Error types for the feed monitor

use serde_json::error::Category;
use thiserror::Error;

/// Feed monitor errors
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection closed (code {code}): {reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Failed to decode frame: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// A frame that could not be turned into an order book snapshot.
///
/// Recovered locally: the frame is dropped and ingestion continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The bytes are not a JSON document at all.
    #[error("unparsable payload: {0}")]
    Payload(String),

    /// Valid JSON, but a required field is missing or has the wrong shape.
    #[error("malformed snapshot: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => DecodeError::Schema(err.to_string()),
            Category::Syntax | Category::Eof | Category::Io => {
                DecodeError::Payload(err.to_string())
            }
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for MonitorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        MonitorError::Transport(err.to_string())
    }
}

impl From<prometheus::Error> for MonitorError {
    fn from(err: prometheus::Error) -> Self {
        MonitorError::Metrics(err.to_string())
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
