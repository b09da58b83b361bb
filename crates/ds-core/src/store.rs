//! Snapshot files.
//!
//! Two encodings of the same [`RunSnapshot`]:
//!
//! - JSON (`serde_json`, pretty-printed) for inspection and hand edits
//! - a compact binary archive (`rkyv`) for large runs
//!
//! Loading always goes through [`RunSnapshot::validate`], so a bad file is an
//! error rather than a corrupted run.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::error::DsError;
use crate::run::RunData;
use crate::snapshot::RunSnapshot;

/// Write `run` as pretty JSON.
pub fn save_json(run: &RunData, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&run.snapshot())?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!("[{}] snapshot saved to {}", run.name(), path.display());
    Ok(())
}

/// Read a JSON snapshot and rebuild the run.
pub fn load_json(path: &Path) -> anyhow::Result<RunData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let snapshot: RunSnapshot = serde_json::from_str(&content)?;
    Ok(RunData::from_snapshot(snapshot)?)
}

/// Encode a snapshot with rkyv.
pub fn encode_archive(snapshot: &RunSnapshot) -> Result<Vec<u8>, DsError> {
    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(snapshot)
        .map_err(|e| DsError::Archive(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Decode a snapshot produced by [`encode_archive`].
///
/// The payload is copied into an aligned buffer first; file contents carry
/// no alignment guarantee.
pub fn decode_archive(payload: &[u8]) -> Result<RunSnapshot, DsError> {
    let mut aligned = rkyv::util::AlignedVec::<8>::with_capacity(payload.len());
    aligned.extend_from_slice(payload);
    rkyv::from_bytes::<RunSnapshot, rkyv::rancor::Error>(&aligned)
        .map_err(|e| DsError::Archive(e.to_string()))
}

/// Write `run` as a binary archive.
pub fn save_archive(run: &RunData, path: &Path) -> anyhow::Result<()> {
    let bytes = encode_archive(&run.snapshot())?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    info!("[{}] archive saved to {}", run.name(), path.display());
    Ok(())
}

/// Read a binary archive and rebuild the run.
pub fn load_archive(path: &Path) -> anyhow::Result<RunData> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(RunData::from_snapshot(decode_archive(&bytes)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;

    fn sample_run() -> RunData {
        let mut run = RunData::new("store", 1_000, 1.0, 5);
        run.record_latency(Sample::new(1, 0.25, 1_000, 2_000_000)).unwrap();
        run.record_latency(Sample::new(3, 3.75, 1_000, 4_000_000)).unwrap();
        run.record_latency(Sample::new(4, 1.5, 1_000, 5_000_000)).unwrap();
        run
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ds-core-{}-{name}", std::process::id()))
    }

    #[test]
    fn json_file_round_trip() {
        let run = sample_run();
        let path = temp_path("run.json");
        save_json(&run, &path).unwrap();
        let back = load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back.snapshot(), run.snapshot());
        assert_eq!(back.histogram().bins(), run.histogram().bins());
    }

    #[test]
    fn archive_file_round_trip() {
        let run = sample_run();
        let path = temp_path("run.bin");
        save_archive(&run, &path).unwrap();
        let back = load_archive(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back.snapshot(), run.snapshot());
        assert_eq!(back.ordered_samples().len(), 3);
    }

    #[test]
    fn garbage_archive_is_an_error() {
        assert!(matches!(decode_archive(&[1, 2, 3]), Err(DsError::Archive(_))));
    }

    #[test]
    fn json_without_histogram_contents() {
        let json = serde_json::to_value(sample_run().snapshot()).unwrap();
        assert_eq!(json["bin_count"], 5);
        assert!(json.get("bins").is_none());
        assert_eq!(json["missing"].as_array().unwrap().len(), 3);
    }
}
