//! Ingestion path: decode, estimate latency, count, stage

use std::time::{Duration, Instant};

use tracing::warn;

use crate::config::Config;
use crate::decoder::decode;
use crate::error::DecodeError;
use crate::metrics::{FeedTelemetry, LatencyEstimate, LatencyEstimator, ThroughputCounter};
use crate::render::StagingCell;

/// Per-frame processing shared by every inbound message
pub struct Pipeline {
    estimator: LatencyEstimator,
    throughput: ThroughputCounter,
    staging: StagingCell,
    telemetry: FeedTelemetry,
    slow_ingest: Duration,
}

impl Pipeline {
    pub fn new(config: &Config, telemetry: FeedTelemetry) -> Self {
        Self::with_estimator(
            LatencyEstimator::new(config.skew_placeholder_max_ms),
            Duration::from_micros(config.slow_ingest_warn_us),
            telemetry,
        )
    }

    pub fn with_estimator(
        estimator: LatencyEstimator,
        slow_ingest: Duration,
        telemetry: FeedTelemetry,
    ) -> Self {
        Self {
            estimator,
            throughput: ThroughputCounter::new(),
            staging: StagingCell::new(),
            telemetry,
            slow_ingest,
        }
    }

    /// Process one raw frame received at `received_at_ms`.
    ///
    /// On a decode failure nothing is staged or counted as throughput; the
    /// previously staged frame stays in place.
    pub fn ingest(&mut self, raw: &[u8], received_at_ms: i64) -> Result<LatencyEstimate, DecodeError> {
        let started = Instant::now();
        self.telemetry.frames_received.inc();

        let snapshot = decode(raw).inspect_err(|_| self.telemetry.decode_errors.inc())?;

        let latency = self.estimator.estimate(received_at_ms, snapshot.server_time);
        if latency.skew_corrected {
            self.telemetry.skew_corrections.inc();
        }

        self.throughput.tick();
        self.staging.set(snapshot, latency);

        self.telemetry.frames_decoded.inc();
        self.telemetry
            .latency_ms
            .set(i64::try_from(latency.millis).unwrap_or(i64::MAX));

        let elapsed = started.elapsed();
        self.telemetry.ingest_duration.observe(elapsed.as_secs_f64());
        if elapsed > self.slow_ingest {
            warn!(
                duration_us = elapsed.as_micros() as u64,
                len = raw.len(),
                "Slow ingest"
            );
        }

        Ok(latency)
    }

    /// Close the throughput window and return its count
    pub fn sample_throughput(&self) -> u64 {
        let sample = self.throughput.sample();
        self.telemetry
            .throughput_hz
            .set(i64::try_from(sample).unwrap_or(i64::MAX));
        sample
    }

    pub fn staging(&self) -> &StagingCell {
        &self.staging
    }

    pub fn telemetry(&self) -> &FeedTelemetry {
        &self.telemetry
    }
}
