//! Render scheduler
//!
//! Promotes the staging buffer to the display state on a fixed cadence,
//! bounding UI refreshes to one per period whatever the inbound rate.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::{DisplayState, StagingCell};

/// Fixed-period ticker whose first tick is one period from now
pub fn periodic(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[derive(Debug)]
pub struct RenderScheduler {
    period: Duration,
    renders: u64,
}

impl RenderScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period, renders: 0 }
    }

    pub fn ticker(&self) -> Interval {
        periodic(self.period)
    }

    /// Copy the staged frame into `display`.
    ///
    /// No-op until the first frame has been staged. Returns whether a copy
    /// happened.
    pub fn tick(&mut self, staging: &StagingCell, display: &mut DisplayState) -> bool {
        match staging.copy() {
            Some(frame) => {
                display.apply(frame);
                self.renders += 1;
                true
            }
            None => false,
        }
    }

    /// Ticks that promoted a frame
    pub fn renders(&self) -> u64 {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{Level, OrderBookSnapshot};
    use crate::metrics::LatencyEstimate;

    fn snapshot(price: f64) -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: vec![Level {
                price,
                quantity: 1.0,
            }],
            asks: vec![],
            event_time: 0,
            server_time: 0,
        }
    }

    #[test]
    fn test_tick_without_frame_is_noop() {
        let mut scheduler = RenderScheduler::new(Duration::from_millis(100));
        let staging = StagingCell::new();
        let mut display = DisplayState::new();

        assert!(!scheduler.tick(&staging, &mut display));
        assert!(display.snapshot.is_none());
        assert_eq!(scheduler.renders(), 0);
    }

    #[test]
    fn test_tick_shows_only_latest_overwrite() {
        let mut scheduler = RenderScheduler::new(Duration::from_millis(100));
        let mut staging = StagingCell::new();
        let mut display = DisplayState::new();

        for price in [1.0, 2.0, 3.0] {
            staging.set(snapshot(price), LatencyEstimate::measured(price as u64));
        }
        assert!(display.snapshot.is_none());

        assert!(scheduler.tick(&staging, &mut display));
        assert_eq!(display.snapshot, Some(snapshot(3.0)));
        assert_eq!(display.latency, LatencyEstimate::measured(3));
    }

    #[test]
    fn test_display_retains_last_good_frame() {
        let mut scheduler = RenderScheduler::new(Duration::from_millis(100));
        let mut staging = StagingCell::new();
        let mut display = DisplayState::new();

        staging.set(snapshot(1.0), LatencyEstimate::measured(1));
        scheduler.tick(&staging, &mut display);
        scheduler.tick(&staging, &mut display);
        assert_eq!(display.snapshot, Some(snapshot(1.0)));
        assert_eq!(scheduler.renders(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let start = Instant::now();
        let mut ticker = periodic(Duration::from_millis(100));

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(100));
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }
}
