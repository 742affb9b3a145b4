//! Decoder for order book snapshot frames
//!
//! Each inbound frame is a full replacement view of the book:
//!
//! ```text
//! { "bids": [[price, qty], ...], "asks": [[price, qty], ...],
//!   "eventTime": <ms>, "serverTime": <ms> }
//! ```
//!
//! Decoding fails closed: a frame with a missing or mistyped field never
//! yields a partially populated snapshot.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Price level (price, quantity pair), carried on the wire as a 2-element array
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Level {
    pub price: f64,
    pub quantity: f64,
}

impl From<(f64, f64)> for Level {
    fn from((price, quantity): (f64, f64)) -> Self {
        Self { price, quantity }
    }
}

impl From<Level> for (f64, f64) {
    fn from(level: Level) -> Self {
        (level.price, level.quantity)
    }
}

/// Full order book snapshot as emitted by the feed service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookSnapshot {
    /// Bids, best first
    pub bids: Vec<Level>,

    /// Asks, best first
    pub asks: Vec<Level>,

    /// Exchange-assigned event time (ms since epoch)
    pub event_time: i64,

    /// Time the ingestion service sent the frame (ms since epoch)
    pub server_time: i64,
}

impl OrderBookSnapshot {
    /// Decode a raw text or binary frame
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        decode(raw)
    }
}

/// Decode a raw frame into a snapshot.
///
/// Text frames are passed as their UTF-8 bytes.
pub fn decode(raw: &[u8]) -> Result<OrderBookSnapshot, DecodeError> {
    // serde's derived struct visitor also accepts a positional array
    match raw.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'[') => {
            return Err(DecodeError::Schema(
                "expected a JSON object, found an array".to_string(),
            ))
        }
        None => return Err(DecodeError::Payload("empty frame".to_string())),
        _ => {}
    }

    Ok(serde_json::from_slice(raw)?)
}
