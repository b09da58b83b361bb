//! Typed change notifications for runs and histograms.
//!
//! Each [`RunData`](crate::run::RunData) and
//! [`Histogram`](crate::histogram::Histogram) owns its own [`Publisher`].
//! Consumers call `subscribe()` and drain the returned crossbeam receiver on
//! whatever thread they like; publishing never blocks the ingesting thread.

use crossbeam_channel::{Receiver, Sender};

use crate::sample::RecordedSample;

/// Which histogram buckets changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinChange {
    /// A single bucket was incremented.
    Bin(usize),
    /// Every bucket may have changed (bulk replace, clear).
    All,
}

/// A typed event emitted by a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// The run was (re)started and all previous data dropped.
    Began {
        name: String,
        start_time_us: u64,
    },

    /// A real sample was ingested.
    SampleRecorded {
        sample: RecordedSample,
        /// Position in the chronological sample list.
        index: usize,
        /// Samples lost immediately before this one.
        missing_count: u64,
    },

    /// The run was marked finished.
    Ended {
        end_time_us: u64,
    },
}

/// Fan-out sender over unbounded crossbeam channels.
///
/// Receivers that have been dropped are pruned on the next publish.
pub struct Publisher<E> {
    subscribers: Vec<Sender<E>>,
}

impl<E: Clone> Publisher<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a new observer.
    pub fn subscribe(&mut self) -> Receiver<E> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live observer.
    pub fn publish(&mut self, event: E) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of observers still connected as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<E: Clone> Default for Publisher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Publisher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").field("subscribers", &self.subscribers.len()).finish()
    }
}
