//! Versioned persistence layout of a run.
//!
//! A [`RunSnapshot`] carries the real samples (with their frozen stats), the
//! gap-fill entries, the nominal emit interval and the histogram's bucket
//! *count*. Bucket contents, the latency order and the arrival estimate are
//! derived data and are rebuilt by [`RunData::from_snapshot`](crate::RunData::from_snapshot).

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::error::DsError;
use crate::histogram::MAX_BINS;
use crate::sample::{RecordedSample, Sample};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable state of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
pub struct RunSnapshot {
    pub version: u32,
    pub name: String,
    pub start_time_us: u64,
    pub end_time_us: Option<u64>,
    pub emit_interval: f64,
    pub bin_count: u64,
    pub samples: Vec<RecordedSample>,
    pub missing: Vec<Sample>,
}

impl RunSnapshot {
    /// Check what a hand-edited or foreign file could get wrong.
    pub fn validate(&self) -> Result<(), DsError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(DsError::Snapshot(format!(
                "unsupported version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }
        let bins_ok = usize::try_from(self.bin_count).is_ok_and(|n| (1..=MAX_BINS).contains(&n));
        if !bins_ok {
            return Err(DsError::Snapshot(format!(
                "bin_count must be in 1..={MAX_BINS}, got {}",
                self.bin_count
            )));
        }
        if !(self.emit_interval.is_finite() && self.emit_interval > 0.0) {
            return Err(DsError::Snapshot(format!("invalid emit_interval {}", self.emit_interval)));
        }
        for pair in self.samples.windows(2) {
            let (a, b) = (&pair[0].sample, &pair[1].sample);
            if b.identifier <= a.identifier || b.arrived_at_us < a.arrived_at_us {
                return Err(DsError::Snapshot(format!(
                    "samples out of order at #{} -> #{}",
                    a.identifier, b.identifier
                )));
            }
        }
        Ok(())
    }
}
