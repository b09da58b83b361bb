//! Unit-width latency histogram with an overflow bucket.
//!
//! Bucket `i` counts latencies in `[i, i + 1)` seconds. Anything at or beyond
//! `len - 1` lands in the last bucket, and negative values land in bucket 0,
//! so the tail is collapsed rather than dropped.
//!
//! The index of the fullest bucket is tracked incrementally: it only moves
//! when another bucket strictly overtakes it, so ties keep the earlier winner.

use crossbeam_channel::Receiver;
use tracing::debug;

use crate::events::{BinChange, Publisher};

/// Upper bound on the bucket count accepted from config or snapshots.
pub const MAX_BINS: usize = 100_000;

/// Fixed-bucket latency counter.
///
/// Not thread-safe. Owned by a single run and mutated from the ingesting
/// thread only. Observers learn about changes through [`Histogram::subscribe`].
#[derive(Debug)]
pub struct Histogram {
    bins: Vec<u64>,
    max_bin_index: usize,
    changes: Publisher<BinChange>,
}

impl Histogram {
    /// Create a histogram with `size` zeroed buckets.
    ///
    /// # Panics
    ///
    /// Panics when `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "histogram needs at least one bucket");
        Self {
            bins: vec![0; size],
            max_bin_index: 0,
            changes: Publisher::new(),
        }
    }

    /// Bucket that `value` falls into: `clamp(floor(value), 0, len - 1)`.
    #[inline]
    pub fn bin_index_for(&self, value: f64) -> usize {
        let last = self.bins.len() - 1;
        // NaN and negatives both fail this test.
        if !(value > 0.0) {
            return 0;
        }
        // `as` saturates, so huge values stay in range.
        (value.floor() as usize).min(last)
    }

    /// Count `value` and notify observers of the bucket that changed.
    pub fn add(&mut self, value: f64) {
        let idx = self.insert(value);
        self.changes.publish(BinChange::Bin(idx));
    }

    /// Count `value` without notifying anyone.
    pub fn add_silently(&mut self, value: f64) {
        self.insert(value);
    }

    fn insert(&mut self, value: f64) -> usize {
        let idx = self.bin_index_for(value);
        self.bins[idx] += 1;
        if self.bins[idx] > self.bins[self.max_bin_index] {
            self.max_bin_index = idx;
        }
        idx
    }

    /// Drop every count and reallocate with `new_size` buckets.
    ///
    /// Existing data is not re-bucketed; follow up with
    /// [`replace_from_samples`](Self::replace_from_samples).
    ///
    /// # Panics
    ///
    /// Panics when `new_size` is zero.
    pub fn resize(&mut self, new_size: usize) {
        assert!(new_size > 0, "histogram needs at least one bucket");
        debug!("histogram resize {} -> {new_size}", self.bins.len());
        self.bins = vec![0; new_size];
        self.max_bin_index = 0;
    }

    /// Rebuild all counts from `latencies`, then send a single `All` change.
    pub fn replace_from_samples<I>(&mut self, latencies: I)
    where
        I: IntoIterator<Item = f64>,
    {
        self.resize(self.bins.len());
        for latency in latencies {
            self.add_silently(latency);
        }
        self.changes.publish(BinChange::All);
    }

    /// Copy bucket counts and the max index from `other`.
    pub fn replace_from(&mut self, other: &Histogram) {
        self.bins.clone_from(&other.bins);
        self.max_bin_index = other.max_bin_index;
        self.changes.publish(BinChange::All);
    }

    /// Zero every bucket, keeping the bucket count.
    pub fn clear(&mut self) {
        self.bins.fill(0);
        self.max_bin_index = 0;
        self.changes.publish(BinChange::All);
    }

    /// Register an observer for bucket changes.
    pub fn subscribe(&mut self) -> Receiver<BinChange> {
        self.changes.subscribe()
    }

    #[inline]
    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    /// Number of buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Always `false`; a histogram has at least one bucket.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    #[inline]
    pub fn max_bin_index(&self) -> usize {
        self.max_bin_index
    }

    /// Count held by the fullest bucket.
    #[inline]
    pub fn max_count(&self) -> u64 {
        self.bins[self.max_bin_index]
    }

    /// Sum of every bucket.
    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }
}
