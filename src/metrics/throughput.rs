//! Per-window message throughput counter

use std::sync::atomic::{AtomicU64, Ordering};

/// Counts decoded messages within the current sampling window.
///
/// `sample` reads and resets in a single atomic swap, so a `tick` racing
/// with it lands in exactly one window.
#[derive(Debug, Default)]
pub struct ThroughputCounter {
    count: AtomicU64,
}

impl ThroughputCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one decoded message
    pub fn tick(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Close the current window: return its count and start a new one at zero
    pub fn sample(&self) -> u64 {
        self.count.swap(0, Ordering::AcqRel)
    }
}
