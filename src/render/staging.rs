//! Render staging buffer

use crate::decoder::OrderBookSnapshot;
use crate::metrics::LatencyEstimate;

/// Latest decoded snapshot together with its latency estimate
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFrame {
    pub snapshot: OrderBookSnapshot,
    pub latency: LatencyEstimate,
}

/// Holds only the most recent frame; every `set` overwrites the previous one.
///
/// The cell is owned by the engine task: the ingestion path writes through
/// `&mut self` and the render path reads through `&self`, so access is
/// exclusive by construction and neither side blocks.
#[derive(Debug, Default)]
pub struct StagingCell {
    latest: Option<StagedFrame>,
    writes: u64,
}

impl StagingCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the staged frame. Older unseen frames are discarded.
    pub fn set(&mut self, snapshot: OrderBookSnapshot, latency: LatencyEstimate) {
        self.latest = Some(StagedFrame { snapshot, latency });
        self.writes += 1;
    }

    /// Copy of the staged frame, `None` until the first `set`
    pub fn copy(&self) -> Option<StagedFrame> {
        self.latest.clone()
    }

    /// Total overwrites since creation
    pub fn writes(&self) -> u64 {
        self.writes
    }
}
