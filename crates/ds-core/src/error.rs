//! Typed error definitions for DataSampler.
//!
//! [`DsError`] covers the recoverable failures of the core crate. Caller bugs
//! (zero-sized histograms, out-of-range indexing) are panics, not variants.
//! All variants implement `std::error::Error` via `thiserror`, so they
//! integrate with `anyhow::Result` in the binaries.

use thiserror::Error;

/// Domain-specific errors for DataSampler.
#[derive(Debug, Error)]
pub enum DsError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// A sample whose identifier or arrival time does not move forward.
    #[error("sample {identifier} out of order (previous identifier {previous})")]
    OutOfOrder {
        /// Identifier of the last accepted sample.
        previous: u64,
        /// Identifier of the rejected sample.
        identifier: u64,
    },

    /// A sample too far past the previous identifier to gap-fill.
    #[error("sample {identifier} skips too many identifiers after {previous}")]
    GapTooLarge {
        /// Identifier of the last accepted sample.
        previous: u64,
        /// Identifier of the rejected sample.
        identifier: u64,
    },

    /// Snapshot failed validation on load.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Binary archive encode/decode error.
    #[error("archive error: {0}")]
    Archive(String),

    /// File system error while saving or loading.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
