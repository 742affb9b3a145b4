//! Display-visible state and the metrics surface served to the UI

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::StagedFrame;
use crate::decoder::{Level, OrderBookSnapshot};
use crate::metrics::LatencyEstimate;
use crate::stream::StreamEvent;

/// Display state shared between the engine and its readers
pub type SharedDisplay = Arc<RwLock<DisplayState>>;

/// Connection status shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Errored,
}

impl ConnectionStatus {
    /// Status after a lifecycle event. Data frames leave it unchanged.
    pub fn transition(self, event: &StreamEvent) -> Self {
        match event {
            StreamEvent::Opened => ConnectionStatus::Connected,
            StreamEvent::Closed { .. } => ConnectionStatus::Disconnected,
            StreamEvent::Errored(_) => ConnectionStatus::Errored,
            StreamEvent::Message(_) => self,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Errored => "errored",
        };
        f.write_str(text)
    }
}

/// One formatted book row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub price: String,
    pub quantity: String,
}

impl DisplayRow {
    pub fn from_level(level: &Level) -> Self {
        Self {
            price: format!("{:.2}", level.price),
            quantity: format!("{:.4}", level.quantity),
        }
    }
}

impl fmt::Display for DisplayRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.price, self.quantity)
    }
}

/// What the presentation layer sees.
///
/// Written by the render scheduler (snapshot, latency), the throughput
/// sampler and the stream lifecycle (status). A `Connected` status with an
/// old snapshot is a valid state: status and staleness are independent.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub snapshot: Option<OrderBookSnapshot>,
    pub latency: LatencyEstimate,
    pub throughput_hz: u64,
    pub status: ConnectionStatus,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedDisplay {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Promote a staged frame to the visible state
    pub fn apply(&mut self, frame: StagedFrame) {
        self.snapshot = Some(frame.snapshot);
        self.latency = frame.latency;
    }

    pub fn bid_rows(&self) -> Vec<DisplayRow> {
        self.rows(|snapshot| &snapshot.bids)
    }

    pub fn ask_rows(&self) -> Vec<DisplayRow> {
        self.rows(|snapshot| &snapshot.asks)
    }

    fn rows(&self, side: impl Fn(&OrderBookSnapshot) -> &Vec<Level>) -> Vec<DisplayRow> {
        self.snapshot
            .as_ref()
            .map(|snapshot| side(snapshot).iter().map(DisplayRow::from_level).collect())
            .unwrap_or_default()
    }

    pub fn surface(&self) -> MetricsSurface {
        MetricsSurface {
            snapshot: self.snapshot.clone(),
            latency_text: self.latency.to_string(),
            latency_skew_corrected: self.latency.skew_corrected,
            throughput_hz: self.throughput_hz,
            connection_status: self.status,
            bid_rows: self.bid_rows(),
            ask_rows: self.ask_rows(),
        }
    }
}

/// Serialized view of [`DisplayState`] for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSurface {
    pub snapshot: Option<OrderBookSnapshot>,
    pub latency_text: String,
    pub latency_skew_corrected: bool,
    pub throughput_hz: u64,
    pub connection_status: ConnectionStatus,
    pub bid_rows: Vec<DisplayRow>,
    pub ask_rows: Vec<DisplayRow>,
}
