//! One-way latency estimation with clock-skew correction

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

/// Default upper bound (inclusive) of the skew placeholder, in milliseconds
pub const DEFAULT_SKEW_PLACEHOLDER_MAX_MS: u64 = 2;

/// Estimated one-way delay of a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyEstimate {
    pub millis: u64,

    /// Set when the raw delta was negative and a placeholder was substituted.
    /// The value is then an approximation, not a measurement.
    pub skew_corrected: bool,
}

impl LatencyEstimate {
    pub fn measured(millis: u64) -> Self {
        Self {
            millis,
            skew_corrected: false,
        }
    }
}

impl fmt::Display for LatencyEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.millis)
    }
}

/// Computes `receive - serverTime`, substituting a small random value when
/// sender and receiver clocks disagree enough to make it negative.
///
/// This masks skew rather than measuring it; a proper offset handshake
/// would be needed for true one-way latency.
#[derive(Debug)]
pub struct LatencyEstimator {
    rng: StdRng,
    placeholder_max_ms: u64,
}

impl LatencyEstimator {
    pub fn new(placeholder_max_ms: u64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            placeholder_max_ms,
        }
    }

    /// Deterministic estimator for reproducible runs
    pub fn with_seed(placeholder_max_ms: u64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            placeholder_max_ms,
        }
    }

    pub fn estimate(&mut self, received_at_ms: i64, server_time_ms: i64) -> LatencyEstimate {
        let raw = received_at_ms.saturating_sub(server_time_ms);
        if raw >= 0 {
            return LatencyEstimate::measured(raw as u64);
        }

        let placeholder = self.rng.gen_range(0..=self.placeholder_max_ms);
        debug!(
            raw_delta_ms = raw,
            placeholder_ms = placeholder,
            "Negative latency, substituting skew placeholder"
        );
        LatencyEstimate {
            millis: placeholder,
            skew_corrected: true,
        }
    }
}

impl Default for LatencyEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SKEW_PLACEHOLDER_MAX_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_delta_when_non_negative() {
        let mut estimator = LatencyEstimator::with_seed(2, 7);
        assert_eq!(estimator.estimate(1005, 1000), LatencyEstimate::measured(5));
        assert_eq!(estimator.estimate(1000, 1000), LatencyEstimate::measured(0));
        assert_eq!(
            estimator.estimate(1_700_000_000_250, 1_700_000_000_000),
            LatencyEstimate::measured(250)
        );
    }

    #[test]
    fn test_skew_never_negative() {
        let mut estimator = LatencyEstimator::with_seed(DEFAULT_SKEW_PLACEHOLDER_MAX_MS, 42);
        for ahead in 1..500 {
            let estimate = estimator.estimate(1000, 1000 + ahead);
            assert!(estimate.millis < 3, "got {}", estimate.millis);
            assert!(estimate.skew_corrected);
        }
    }

    #[test]
    fn test_skew_placeholder_covers_range() {
        let mut estimator = LatencyEstimator::with_seed(2, 1);
        let mut seen = [false; 3];
        for _ in 0..300 {
            seen[estimator.estimate(0, 10).millis as usize] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let mut estimator = LatencyEstimator::with_seed(2, 3);
        let estimate = estimator.estimate(i64::MIN, i64::MAX);
        assert!(estimate.skew_corrected);
        assert_eq!(
            estimator.estimate(i64::MAX, i64::MIN),
            LatencyEstimate::measured(i64::MAX as u64)
        );
    }

    #[test]
    fn test_display_text() {
        assert_eq!(LatencyEstimate::measured(5).to_string(), "5ms");
    }
}
