//! Background CSV log of recorded samples.
//!
//! The [`Recorder`] runs on its own thread and drains a
//! [`RunEvent`] subscription, so disk latency never stalls ingestion. One CSV
//! line is written per recorded sample; lifecycle events become `#` comment
//! lines. Output is flushed on every [`RunEvent::Ended`]; the thread keeps
//! draining across `end`/`begin` and exits once the run is dropped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::events::RunEvent;

/// CSV column header.
pub const CSV_HEADER: &str =
    "identifier,latency,emitted_at_us,arrived_at_us,median,average,missing";

/// Handle to a running recorder thread.
#[derive(Debug)]
pub struct Recorder {
    path: PathBuf,
    handle: JoinHandle<std::io::Result<u64>>,
}

impl Recorder {
    /// Create `path` and start writing events from `rx` into it.
    pub fn spawn(path: &Path, rx: Receiver<RunEvent>) -> anyhow::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{CSV_HEADER}")?;

        let label = path.display().to_string();
        let handle = std::thread::Builder::new()
            .name("ds-recorder".into())
            .spawn(move || record_loop(&label, rx, out))?;

        Ok(Self {
            path: path.to_path_buf(),
            handle,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the thread to finish; returns the number of sample lines.
    ///
    /// The thread only finishes once every sender is gone, so drop the run
    /// first.
    pub fn join(self) -> anyhow::Result<u64> {
        match self.handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => anyhow::bail!("recorder thread for {} panicked", self.path.display()),
        }
    }
}

fn record_loop<W: Write>(
    label: &str,
    rx: Receiver<RunEvent>,
    mut out: W,
) -> std::io::Result<u64> {
    let mut lines = 0u64;
    debug!("[{label}] recorder started");

    while let Ok(event) = rx.recv() {
        match event {
            RunEvent::Began { name, start_time_us } => {
                writeln!(out, "# began {name} {start_time_us}")?;
            }
            RunEvent::SampleRecorded { sample, missing_count, .. } => {
                let s = sample.sample;
                writeln!(
                    out,
                    "{},{:.6},{},{},{:.6},{:.6},{}",
                    s.identifier,
                    s.latency,
                    s.emitted_at_us,
                    s.arrived_at_us,
                    sample.stats.median_latency,
                    sample.stats.average_latency,
                    missing_count,
                )?;
                lines += 1;
            }
            RunEvent::Ended { end_time_us } => {
                writeln!(out, "# ended {end_time_us}")?;
                out.flush()?;
            }
        }
    }

    out.flush()?;
    info!("[{label}] recorder wrote {lines} sample line(s)");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunData;
    use crate::sample::Sample;

    #[test]
    fn writes_one_line_per_sample() {
        let path = std::env::temp_dir().join(format!("ds-recorder-{}.csv", std::process::id()));
        let mut run = RunData::new("rec", 0, 1.0, 4);
        let recorder = Recorder::spawn(&path, run.subscribe()).unwrap();

        run.record_latency(Sample::new(1, 0.5, 500_000, 1_000_000)).unwrap();
        run.record_latency(Sample::new(3, 1.5, 1_500_000, 3_000_000)).unwrap();
        run.end(4_000_000);
        drop(run);

        assert_eq!(recorder.join().unwrap(), 2);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1,0.500000,500000,1000000,0.500000,0.500000,0");
        assert_eq!(lines[2], "3,1.500000,1500000,3000000,1.000000,1.000000,1");
        assert_eq!(lines[3], "# ended 4000000");
    }

    #[test]
    fn stops_when_run_dropped() {
        let path =
            std::env::temp_dir().join(format!("ds-recorder-drop-{}.csv", std::process::id()));
        let mut run = RunData::new("rec", 0, 1.0, 4);
        let recorder = Recorder::spawn(&path, run.subscribe()).unwrap();
        run.record_latency(Sample::new(1, 0.5, 0, 1)).unwrap();
        drop(run);

        assert_eq!(recorder.join().unwrap(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn keeps_logging_after_end_and_restart() {
        let path =
            std::env::temp_dir().join(format!("ds-recorder-restart-{}.csv", std::process::id()));
        let mut run = RunData::new("rec", 0, 1.0, 4);
        let recorder = Recorder::spawn(&path, run.subscribe()).unwrap();

        run.record_latency(Sample::new(1, 0.5, 0, 1_000_000)).unwrap();
        run.end(2_000_000);
        run.record_latency(Sample::new(2, 0.5, 0, 3_000_000)).unwrap();
        run.begin("again", 4_000_000);
        run.record_latency(Sample::new(1, 0.25, 0, 5_000_000)).unwrap();
        run.end(6_000_000);
        drop(run);

        assert_eq!(recorder.join().unwrap(), 3);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[2], "# ended 2000000");
        assert!(lines[3].starts_with("2,"));
        assert_eq!(lines[4], "# began again 4000000");
        assert!(lines[5].starts_with("1,0.250000,"));
        assert_eq!(lines[6], "# ended 6000000");
    }
}
