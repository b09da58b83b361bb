//! Run aggregation: the state behind one recording session.
//!
//! A [`RunData`] ingests real samples in identifier order and keeps:
//!
//! - the chronological list of real samples with their frozen running stats,
//! - synthetic gap-fill entries for identifiers that never arrived,
//! - the same real samples ordered by latency, for the running median,
//! - a unit-width [`Histogram`] of real latencies,
//! - a downward-biased estimate of the inter-arrival interval.
//!
//! Gap-fill entries alternate between zero latency and
//! [`GAP_SENTINEL_LATENCY`] so a time-series plot shows a spike where data
//! was lost. They never reach the histogram or the median.
//!
//! # Thread safety
//!
//! Not thread-safe. One producer feeds one run; observers read through
//! [`RunData::subscribe`] channels.

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::error::DsError;
use crate::events::{BinChange, Publisher, RunEvent};
use crate::histogram::Histogram;
use crate::ordered::{LessFn, OrderedArray};
use crate::sample::{GAP_SENTINEL_LATENCY, RecordedSample, Sample, SampleStats};
use crate::snapshot::{RunSnapshot, SNAPSHOT_VERSION};
use crate::summary::RunSummary;
use crate::time_util::secs_between;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No samples yet.
    Fresh,
    /// At least one real sample ingested.
    Accumulating,
    /// Marked finished by the session owner.
    Ended,
}

/// Largest identifier jump that is still gap-filled; wider jumps are rejected.
pub const MAX_GAP_FILL: u64 = 100_000;

fn by_latency(a: &Sample, b: &Sample) -> bool {
    a.latency < b.latency
}

fn latency_ordered() -> OrderedArray<Sample> {
    let less: LessFn<Sample> = by_latency;
    OrderedArray::with_predicate(less)
}

/// Fold one more inter-arrival gap into the estimate.
///
/// `prior` is the number of real samples received before the one that closed
/// `gap`. The second sample seeds the estimate; later ones can only lower it.
fn next_arrival_estimate(current: Option<f64>, gap: f64, prior: usize) -> f64 {
    match current {
        None => gap,
        Some(est) => {
            let n = prior as f64;
            est.min((gap + est * (n - 1.0)) / n)
        }
    }
}

/// Aggregated state of one recording session.
#[derive(Debug)]
pub struct RunData {
    name: String,
    start_time_us: u64,
    end_time_us: Option<u64>,
    /// Nominal producer interval in seconds.
    emit_interval: f64,
    state: RunState,
    samples: Vec<RecordedSample>,
    missing: Vec<Sample>,
    ordered: OrderedArray<Sample>,
    histogram: Histogram,
    est_arrival_interval: Option<f64>,
    events: Publisher<RunEvent>,
}

impl RunData {
    /// Create an empty run.
    ///
    /// # Panics
    ///
    /// Panics when `bin_count` is zero.
    pub fn new(
        name: impl Into<String>,
        start_time_us: u64,
        emit_interval: f64,
        bin_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            start_time_us,
            end_time_us: None,
            emit_interval,
            state: RunState::Fresh,
            samples: Vec::new(),
            missing: Vec::new(),
            ordered: latency_ordered(),
            histogram: Histogram::new(bin_count),
            est_arrival_interval: None,
            events: Publisher::new(),
        }
    }

    /// Ingest the next real sample.
    ///
    /// Returns the sample with its running statistics. A sample whose
    /// identifier does not exceed the previous one, or whose arrival time is
    /// earlier, is rejected and the run is left untouched. So is a sample
    /// more than [`MAX_GAP_FILL`] identifiers past the previous one.
    pub fn record_latency(&mut self, sample: Sample) -> Result<RecordedSample, DsError> {
        if self.state == RunState::Ended {
            warn!("[{}] sample #{} recorded after run ended", self.name, sample.identifier);
        }

        let prior = self.samples.len();
        let mut missing_count = 0;
        let mut average_latency = sample.latency;

        if let Some(prev) = self.samples.last().copied() {
            let last = prev.sample;
            if sample.identifier <= last.identifier || sample.arrived_at_us < last.arrived_at_us {
                warn!(
                    "[{}] rejecting sample #{} (previous #{}, arrival {} < {})",
                    self.name,
                    sample.identifier,
                    last.identifier,
                    sample.arrived_at_us,
                    last.arrived_at_us,
                );
                return Err(DsError::OutOfOrder {
                    previous: last.identifier,
                    identifier: sample.identifier,
                });
            }

            missing_count = sample.identifier - last.identifier - 1;
            if missing_count > MAX_GAP_FILL {
                warn!(
                    "[{}] rejecting sample #{}: {missing_count} identifiers skipped since #{}",
                    self.name, sample.identifier, last.identifier,
                );
                return Err(DsError::GapTooLarge {
                    previous: last.identifier,
                    identifier: sample.identifier,
                });
            }
            if missing_count > 0 {
                warn!(
                    "[{}] {missing_count} sample(s) lost before #{}",
                    self.name, sample.identifier,
                );
                self.fill_gap(&last, &sample, missing_count);
            }

            let gap = secs_between(last.arrived_at_us, sample.arrived_at_us);
            self.est_arrival_interval =
                Some(next_arrival_estimate(self.est_arrival_interval, gap, prior));

            let n = prior as f64;
            average_latency = (sample.latency + prev.stats.average_latency * n) / (n + 1.0);
        }

        self.ordered.add(sample);
        let recorded = RecordedSample {
            sample,
            stats: SampleStats {
                median_latency: self.current_median(),
                average_latency,
                missing_count,
            },
        };
        self.samples.push(recorded);
        self.histogram.add(sample.latency);

        if self.state == RunState::Fresh {
            self.state = RunState::Accumulating;
        }

        debug!(
            "[{}] #{} latency={:.3}s median={:.3}s avg={:.3}s",
            self.name,
            sample.identifier,
            sample.latency,
            recorded.stats.median_latency,
            recorded.stats.average_latency,
        );

        self.events.publish(RunEvent::SampleRecorded {
            sample: recorded,
            index: prior,
            missing_count,
        });
        Ok(recorded)
    }

    /// Append `2 * count + 1` markers between `prev` and `next`.
    ///
    /// A zero marker at `prev`'s arrival, then for each lost identifier a
    /// sentinel and a zero at the midpoint of its slot. `count` is at most
    /// [`MAX_GAP_FILL`].
    fn fill_gap(&mut self, prev: &Sample, next: &Sample, count: u64) {
        let base = prev.arrived_at_us;
        let step_us = (next.arrived_at_us - base) as f64 / count as f64;

        let markers = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(2))
            .and_then(|c| c.checked_add(1))
            .unwrap_or(0);
        self.missing.reserve(markers);
        self.missing.push(Sample::new(prev.identifier, 0.0, base, base));
        for i in 0..count {
            let at = base + (step_us * (i as f64 + 0.5)).round() as u64;
            let identifier = prev.identifier + i + 1;
            self.missing.push(Sample::new(identifier, GAP_SENTINEL_LATENCY, at, at));
            self.missing.push(Sample::new(identifier, 0.0, at, at));
        }
    }

    fn current_median(&self) -> f64 {
        let count = self.ordered.len();
        let middle = count / 2;
        if count % 2 == 1 {
            self.ordered[middle].latency
        } else {
            (self.ordered[middle].latency + self.ordered[middle - 1].latency) / 2.0
        }
    }

    /// Drop all data and start a new run in place.
    pub fn begin(&mut self, name: impl Into<String>, start_time_us: u64) {
        self.name = name.into();
        self.start_time_us = start_time_us;
        self.end_time_us = None;
        self.state = RunState::Fresh;
        self.samples.clear();
        self.missing.clear();
        self.ordered.remove_all();
        self.est_arrival_interval = None;
        self.histogram.clear();

        info!("[{}] run started at {start_time_us}", self.name);
        self.events.publish(RunEvent::Began {
            name: self.name.clone(),
            start_time_us,
        });
    }

    /// Mark the run finished. Later samples are still accepted.
    pub fn end(&mut self, end_time_us: u64) {
        self.end_time_us = Some(end_time_us);
        self.state = RunState::Ended;

        info!(
            "[{}] run ended, {} sample(s), {} gap marker(s)",
            self.name,
            self.samples.len(),
            self.missing.len(),
        );
        self.events.publish(RunEvent::Ended { end_time_us });
    }

    /// Change the number of histogram buckets and re-bucket every real sample.
    ///
    /// # Panics
    ///
    /// Panics when `bin_count` is zero.
    pub fn set_bin_count(&mut self, bin_count: usize) {
        info!("[{}] histogram bins {} -> {bin_count}", self.name, self.histogram.len());
        self.histogram.resize(bin_count);
        self.histogram.replace_from_samples(self.samples.iter().map(RecordedSample::latency));
    }

    /// Register an observer for run events.
    pub fn subscribe(&mut self) -> Receiver<RunEvent> {
        self.events.subscribe()
    }

    /// Register an observer for histogram bucket changes.
    pub fn subscribe_histogram(&mut self) -> Receiver<BinChange> {
        self.histogram.subscribe()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time_us(&self) -> u64 {
        self.start_time_us
    }

    pub fn end_time_us(&self) -> Option<u64> {
        self.end_time_us
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Nominal producer interval in seconds.
    pub fn emit_interval(&self) -> f64 {
        self.emit_interval
    }

    /// Smoothed inter-arrival estimate in seconds; `None` before two samples.
    pub fn est_arrival_interval(&self) -> Option<f64> {
        self.est_arrival_interval
    }

    /// Real samples in arrival order.
    pub fn samples(&self) -> &[RecordedSample] {
        &self.samples
    }

    /// Gap-fill entries in time order.
    pub fn missing(&self) -> &[Sample] {
        &self.missing
    }

    /// Real samples ordered by latency.
    pub fn ordered_samples(&self) -> &OrderedArray<Sample> {
        &self.ordered
    }

    /// The `index`-th smallest latency sample.
    ///
    /// # Panics
    ///
    /// Panics when `index >= len()`.
    pub fn ordered_sample(&self, index: usize) -> &Sample {
        &self.ordered[index]
    }

    pub fn min_latency_sample(&self) -> Option<&Sample> {
        self.ordered.first()
    }

    pub fn max_latency_sample(&self) -> Option<&Sample> {
        self.ordered.last()
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn latest(&self) -> Option<&RecordedSample> {
        self.samples.last()
    }

    /// Number of real samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Summary statistics. Returns `None` if no samples recorded.
    pub fn summary(&self) -> Option<RunSummary> {
        RunSummary::from_run(self)
    }

    /// Capture the persistent part of the run.
    ///
    /// Only the histogram's bucket count is kept; contents are rebuilt on load.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            version: SNAPSHOT_VERSION,
            name: self.name.clone(),
            start_time_us: self.start_time_us,
            end_time_us: self.end_time_us,
            emit_interval: self.emit_interval,
            bin_count: self.histogram.len() as u64,
            samples: self.samples.clone(),
            missing: self.missing.clone(),
        }
    }

    /// Rebuild a run from a snapshot.
    ///
    /// The latency order, histogram and arrival estimate are recomputed by
    /// replaying the stored samples; the stored per-sample stats are kept.
    pub fn from_snapshot(snapshot: RunSnapshot) -> Result<Self, DsError> {
        snapshot.validate()?;

        let bin_count = usize::try_from(snapshot.bin_count)
            .map_err(|_| DsError::Snapshot(format!("bin_count {} too large", snapshot.bin_count)))?;

        let mut run =
            Self::new(snapshot.name, snapshot.start_time_us, snapshot.emit_interval, bin_count);
        for (prior, recorded) in snapshot.samples.iter().enumerate() {
            if let Some(prev) = run.samples.last() {
                let gap = secs_between(prev.sample.arrived_at_us, recorded.sample.arrived_at_us);
                run.est_arrival_interval =
                    Some(next_arrival_estimate(run.est_arrival_interval, gap, prior));
            }
            run.ordered.add(recorded.sample);
            run.histogram.add_silently(recorded.latency());
            run.samples.push(*recorded);
        }
        run.missing = snapshot.missing;
        run.end_time_us = snapshot.end_time_us;
        run.state = match (run.end_time_us, run.samples.is_empty()) {
            (Some(_), _) => RunState::Ended,
            (None, true) => RunState::Fresh,
            (None, false) => RunState::Accumulating,
        };

        info!("[{}] restored {} sample(s) from snapshot", run.name, run.samples.len());
        Ok(run)
    }
}
