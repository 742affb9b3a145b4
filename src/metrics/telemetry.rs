//! Prometheus telemetry for the ingestion path

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

use crate::error::{MonitorError, Result};

/// Ingest duration buckets, in seconds (1µs .. 10ms)
const INGEST_BUCKETS: &[f64] = &[
    0.000_001, 0.000_005, 0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01,
];

/// Counters and gauges for one engine, held on their own registry
#[derive(Clone)]
pub struct FeedTelemetry {
    registry: Registry,
    pub frames_received: IntCounter,
    pub frames_decoded: IntCounter,
    pub decode_errors: IntCounter,
    pub skew_corrections: IntCounter,
    pub transport_errors: IntCounter,
    pub latency_ms: IntGauge,
    pub throughput_hz: IntGauge,
    pub ingest_duration: Histogram,
}

impl FeedTelemetry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let frames_received =
            IntCounter::new("feed_frames_received_total", "Raw frames received from the stream")?;
        let frames_decoded =
            IntCounter::new("feed_frames_decoded_total", "Frames decoded into snapshots")?;
        let decode_errors =
            IntCounter::new("feed_decode_errors_total", "Frames dropped as malformed")?;
        let skew_corrections = IntCounter::new(
            "feed_skew_corrections_total",
            "Latency estimates replaced by the skew placeholder",
        )?;
        let transport_errors =
            IntCounter::new("feed_transport_errors_total", "Transport errors reported by the stream")?;
        let latency_ms = IntGauge::new("feed_latency_ms", "Most recent latency estimate")?;
        let throughput_hz =
            IntGauge::new("feed_throughput_hz", "Decoded frames in the last closed window")?;
        let ingest_duration = Histogram::with_opts(
            HistogramOpts::new("feed_ingest_duration_seconds", "Decode and stage time per frame")
                .buckets(INGEST_BUCKETS.to_vec()),
        )?;

        registry.register(Box::new(frames_received.clone()))?;
        registry.register(Box::new(frames_decoded.clone()))?;
        registry.register(Box::new(decode_errors.clone()))?;
        registry.register(Box::new(skew_corrections.clone()))?;
        registry.register(Box::new(transport_errors.clone()))?;
        registry.register(Box::new(latency_ms.clone()))?;
        registry.register(Box::new(throughput_hz.clone()))?;
        registry.register(Box::new(ingest_duration.clone()))?;

        Ok(Self {
            registry,
            frames_received,
            frames_decoded,
            decode_errors,
            skew_corrections,
            transport_errors,
            latency_ms,
            throughput_hz,
            ingest_duration,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MonitorError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_independent_registries() {
        let first = FeedTelemetry::new().unwrap();
        let second = FeedTelemetry::new().unwrap();
        first.frames_received.inc();
        assert_eq!(first.frames_received.get(), 1);
        assert_eq!(second.frames_received.get(), 0);
    }

    #[test]
    fn test_encode_text_format() {
        let telemetry = FeedTelemetry::new().unwrap();
        telemetry.decode_errors.inc_by(3);
        telemetry.throughput_hz.set(2500);

        let text = telemetry.encode().unwrap();
        assert!(text.contains("feed_decode_errors_total 3"));
        assert!(text.contains("feed_throughput_hz 2500"));
        assert!(text.contains("feed_ingest_duration_seconds_bucket"));
    }
}
