//! Latency samples, the records flowing from the producer into a run.
//!
//! A [`Sample`] is the raw measurement and never changes after the producer
//! builds it. The running statistics a run computes while ingesting it are
//! kept next to it in [`SampleStats`], bundled as a [`RecordedSample`].
//!
//! # Timestamp convention
//!
//! Timestamps are **microseconds since Unix epoch**; latencies are seconds.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::time_util::secs_between;

/// Latency plotted for synthetic gap-fill entries that mark a lost sample.
pub const GAP_SENTINEL_LATENCY: f64 = 100_000.0;

/// A single latency measurement.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
pub struct Sample {
    /// Producer-assigned sequence number, strictly increasing within a run.
    pub identifier: u64,
    /// Measured latency in seconds.
    pub latency: f64,
    pub emitted_at_us: u64,
    pub arrived_at_us: u64,
}

impl Sample {
    pub fn new(identifier: u64, latency: f64, emitted_at_us: u64, arrived_at_us: u64) -> Self {
        Self {
            identifier,
            latency,
            emitted_at_us,
            arrived_at_us,
        }
    }

    /// Seconds between emission and arrival, as seen by the local clock.
    #[inline]
    pub fn transit(&self) -> f64 {
        secs_between(self.emitted_at_us, self.arrived_at_us)
    }

    /// Whether this is the high sentinel of a gap-fill sequence.
    #[inline]
    pub fn is_gap_marker(&self) -> bool {
        self.latency >= GAP_SENTINEL_LATENCY
    }
}

/// Running statistics computed when a sample is ingested, frozen afterwards.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
pub struct SampleStats {
    /// Median of every real latency up to and including this sample.
    pub median_latency: f64,
    /// Mean of every real latency up to and including this sample.
    pub average_latency: f64,
    /// Number of samples lost immediately before this one.
    pub missing_count: u64,
}

/// A real sample together with its ingestion-time statistics.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
pub struct RecordedSample {
    pub sample: Sample,
    pub stats: SampleStats,
}

impl RecordedSample {
    #[inline]
    pub fn identifier(&self) -> u64 {
        self.sample.identifier
    }

    #[inline]
    pub fn latency(&self) -> f64 {
        self.sample.latency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transit_uses_timestamps() {
        let s = Sample::new(1, 0.25, 1_000_000, 1_250_000);
        assert!((s.transit() - 0.25).abs() < 1e-12);
        assert!(!s.is_gap_marker());
    }

    #[test]
    fn sentinel_is_gap_marker() {
        let s = Sample::new(3, GAP_SENTINEL_LATENCY, 10, 10);
        assert!(s.is_gap_marker());
    }
}
