//! Printable summary of a run's statistics.

use crate::run::RunData;

/// Computed run statistics, latencies in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub count: usize,
    /// Sum of `missing_count` over every real sample.
    pub lost: u64,
    pub min: f64,
    pub max: f64,
    /// Median as of the latest sample.
    pub median: f64,
    /// Mean as of the latest sample.
    pub average: f64,
    pub est_arrival_interval: Option<f64>,
    pub peak_bin: usize,
    pub peak_count: u64,
}

impl RunSummary {
    /// Summarise `run`. Returns `None` if no samples recorded.
    pub fn from_run(run: &RunData) -> Option<Self> {
        let latest = run.latest()?;
        let min = run.min_latency_sample()?.latency;
        let max = run.max_latency_sample()?.latency;
        let histogram = run.histogram();

        Some(Self {
            count: run.len(),
            lost: run.samples().iter().map(|s| s.stats.missing_count).sum(),
            min,
            max,
            median: latest.stats.median_latency,
            average: latest.stats.average_latency,
            est_arrival_interval: run.est_arrival_interval(),
            peak_bin: histogram.max_bin_index(),
            peak_count: histogram.max_count(),
        })
    }

    /// Fraction of emitted samples that never arrived.
    pub fn loss_ratio(&self) -> f64 {
        let emitted = self.count as u64 + self.lost;
        self.lost as f64 / emitted as f64
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} lost={} min={:.3}s max={:.3}s median={:.3}s avg={:.3}s",
            self.count, self.lost, self.min, self.max, self.median, self.average,
        )?;
        if let Some(est) = self.est_arrival_interval {
            write!(f, " interval~{est:.3}s")?;
        }
        write!(f, " peak_bin={}({})", self.peak_bin, self.peak_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;

    #[test]
    fn empty_run_has_no_summary() {
        let run = RunData::new("empty", 0, 1.0, 4);
        assert!(run.summary().is_none());
    }

    #[test]
    fn summarises_latest_state() {
        let mut run = RunData::new("s", 0, 1.0, 4);
        run.record_latency(Sample::new(1, 0.5, 0, 1_000_000)).unwrap();
        run.record_latency(Sample::new(2, 2.5, 0, 2_000_000)).unwrap();
        run.record_latency(Sample::new(4, 1.5, 0, 4_000_000)).unwrap();

        let s = run.summary().unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.lost, 1);
        assert_eq!(s.min, 0.5);
        assert_eq!(s.max, 2.5);
        assert!((s.median - 1.5).abs() < 1e-9);
        assert!((s.average - 1.5).abs() < 1e-9);
        assert_eq!(s.peak_bin, 0);
        assert!((s.loss_ratio() - 0.25).abs() < 1e-9);

        let text = s.to_string();
        assert!(text.starts_with("n=3 lost=1 min=0.500s"));
        assert!(text.contains("interval~1.000s"));
    }
}
