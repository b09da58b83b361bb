//! Configuration parsing for the sampler.
//!
//! Settings are read from a single JSON file and passed explicitly to the
//! pieces that need them. The top-level structure holds logging metadata,
//! run settings, and a `source` block describing the synthetic producer.
//!
//! # Example config
//!
//! ```json
//! {
//!   "meta": { "module_name": "ds-runner", "log_path": "/tmp/ds" },
//!   "run_name": "bench",
//!   "emit_interval_sec": 1.0,
//!   "max_bins": 10,
//!   "source": { "mean_latency_sec": 0.4, "jitter_sec": 0.2, "drop_probability": 0.05, "seed": 7 },
//!   "sample_limit": 120,
//!   "record_path": "/tmp/ds/run.csv",
//!   "snapshot_path": "/tmp/ds/run.json"
//! }
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::DsError;
use crate::histogram::MAX_BINS;

/// Default number of histogram buckets (one per second of latency).
pub const DEFAULT_MAX_BINS: usize = 10;

/// Top-level sampler config, deserialized from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct SamplerConfig {
    /// Module metadata (name, log path).
    pub meta: Option<ModuleMeta>,

    /// Name given to the recorded run (default: `"run"`).
    pub run_name: Option<String>,

    /// Nominal interval between emitted samples, in seconds.
    pub emit_interval_sec: f64,

    /// Histogram bucket count (default: [`DEFAULT_MAX_BINS`]).
    pub max_bins: Option<usize>,

    /// Synthetic producer settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Stop after this many producer ticks. Runs until Ctrl+C when absent.
    pub sample_limit: Option<u64>,

    /// CSV sample log written by the recorder.
    pub record_path: Option<PathBuf>,

    /// JSON snapshot written when the run ends.
    pub snapshot_path: Option<PathBuf>,

    /// Binary snapshot written when the run ends.
    pub archive_path: Option<PathBuf>,
}

/// Module metadata block.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleMeta {
    pub module_name: Option<String>,
    pub log_path: Option<String>,
}

/// Synthetic latency producer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Centre of the generated latency distribution, in seconds.
    pub mean_latency_sec: f64,
    /// Half-width of the uniform jitter around the mean, in seconds.
    pub jitter_sec: f64,
    /// Probability that a tick's sample is lost in transit.
    pub drop_probability: f64,
    /// RNG seed; a fresh seed is drawn when absent.
    pub seed: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mean_latency_sec: 0.5,
            jitter_sec: 0.25,
            drop_probability: 0.0,
            seed: None,
        }
    }
}

impl SamplerConfig {
    /// Returns the run name, defaulting to `"run"`.
    pub fn run_name(&self) -> String {
        self.run_name.clone().unwrap_or_else(|| "run".to_string())
    }

    /// Returns the effective histogram bucket count.
    pub fn effective_max_bins(&self) -> usize {
        self.max_bins.unwrap_or(DEFAULT_MAX_BINS)
    }

    /// Returns the module name used for log files.
    pub fn module_name(&self) -> String {
        self.meta
            .as_ref()
            .and_then(|m| m.module_name.clone())
            .unwrap_or_else(|| "ds-runner".to_string())
    }

    /// Returns the log path.
    pub fn log_path(&self) -> Option<String> {
        self.meta.as_ref().and_then(|m| m.log_path.clone())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), DsError> {
        if !(self.emit_interval_sec.is_finite() && self.emit_interval_sec > 0.0) {
            return Err(DsError::Config(format!(
                "emit_interval_sec must be positive, got {}",
                self.emit_interval_sec
            )));
        }
        let bins = self.effective_max_bins();
        if bins == 0 || bins > MAX_BINS {
            return Err(DsError::Config(format!("max_bins must be in 1..={MAX_BINS}, got {bins}")));
        }
        let s = &self.source;
        if !(0.0..1.0).contains(&s.drop_probability) {
            return Err(DsError::Config(format!(
                "drop_probability must be in [0, 1), got {}",
                s.drop_probability
            )));
        }
        if s.mean_latency_sec < 0.0 || s.jitter_sec < 0.0 {
            return Err(DsError::Config("latency settings must not be negative".into()));
        }
        Ok(())
    }
}

/// Parse and validate a JSON config string.
pub fn parse_config(content: &str) -> anyhow::Result<SamplerConfig> {
    let config: SamplerConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<SamplerConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let c = parse_config(r#"{ "emit_interval_sec": 0.5 }"#).unwrap();
        assert_eq!(c.run_name(), "run");
        assert_eq!(c.effective_max_bins(), DEFAULT_MAX_BINS);
        assert_eq!(c.module_name(), "ds-runner");
        assert_eq!(c.source.drop_probability, 0.0);
        assert!(c.sample_limit.is_none());
        assert!(c.log_path().is_none());
    }

    #[test]
    fn full_config() {
        let c = parse_config(
            r#"{
                "meta": { "module_name": "lab", "log_path": "/tmp/lab" },
                "run_name": "bench",
                "emit_interval_sec": 1.0,
                "max_bins": 20,
                "source": { "mean_latency_sec": 0.4, "drop_probability": 0.1, "seed": 7 },
                "sample_limit": 30,
                "snapshot_path": "/tmp/lab/run.json"
            }"#,
        )
        .unwrap();
        assert_eq!(c.run_name(), "bench");
        assert_eq!(c.effective_max_bins(), 20);
        assert_eq!(c.module_name(), "lab");
        assert_eq!(c.source.seed, Some(7));
        // Unset source fields fall back to defaults.
        assert_eq!(c.source.jitter_sec, 0.25);
        assert_eq!(c.sample_limit, Some(30));
    }

    #[test]
    fn huge_bins_rejected() {
        let at_limit = format!(r#"{{ "emit_interval_sec": 1, "max_bins": {MAX_BINS} }}"#);
        assert_eq!(parse_config(&at_limit).unwrap().effective_max_bins(), MAX_BINS);

        let over = format!(r#"{{ "emit_interval_sec": 1, "max_bins": {} }}"#, MAX_BINS + 1);
        assert!(parse_config(&over).is_err());

        let mut c = parse_config(r#"{ "emit_interval_sec": 1 }"#).unwrap();
        c.max_bins = Some(usize::MAX);
        assert!(matches!(c.validate(), Err(DsError::Config(_))));
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(parse_config(r#"{ "emit_interval_sec": 0 }"#).is_err());
        assert!(parse_config(r#"{ "emit_interval_sec": 1, "max_bins": 0 }"#).is_err());
        assert!(
            parse_config(r#"{ "emit_interval_sec": 1, "source": { "drop_probability": 1.0 } }"#)
                .is_err()
        );
        assert!(parse_config(r#"{ "max_bins": 3 }"#).is_err());
    }
}
