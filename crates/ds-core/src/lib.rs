//! # ds-core
//!
//! Core crate for the DataSampler latency recorder, providing:
//!
//! - **Samples** (`sample`): latency records and their frozen ingestion stats
//! - **Ordered array** (`ordered`): sorted-insertion container for order statistics
//! - **Histogram** (`histogram`): unit-width bucket counter with an overflow bucket
//! - **Run aggregation** (`run`): gap detection, running median/average, arrival estimate
//! - **Events** (`events`): typed per-instance observer channels
//! - **Summary** (`summary`): printable run statistics
//! - **Snapshots** (`snapshot`, `store`): versioned persistence layout, JSON and rkyv files
//! - **Recorder** (`recorder`): background CSV sample log
//! - **Configuration** (`config`): JSON config deserialization
//! - **Error types** (`error`): domain-specific `DsError` via thiserror
//! - **Time utilities** (`time_util`): microsecond timestamps
//! - **Logging** (`logging`): tracing-based structured logging

pub mod config;
pub mod error;
pub mod events;
pub mod histogram;
pub mod logging;
pub mod ordered;
pub mod recorder;
pub mod run;
pub mod sample;
pub mod snapshot;
pub mod store;
pub mod summary;
pub mod time_util;

// Re-export the engine types at crate root for convenience.
pub use error::DsError;
pub use events::{BinChange, RunEvent};
pub use histogram::Histogram;
pub use ordered::OrderedArray;
pub use run::{RunData, RunState};
pub use sample::{RecordedSample, Sample, SampleStats};
pub use summary::RunSummary;
