//! # ds-runner
//!
//! Records one latency run from the synthetic source.
//!
//! Loads a JSON configuration file, starts the timer-driven producer, feeds
//! every sample through a [`RunData`] on a dedicated ingest thread, logs
//! samples to CSV, and writes a snapshot when the run ends.
//!
//! # Usage
//!
//! ```bash
//! ds-runner config.json --log-level info --samples 60 --bins 20
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::Receiver;
use ds_core::config::SamplerConfig;
use ds_core::recorder::Recorder;
use ds_core::time_util::now_us;
use ds_core::{RunData, Sample, store};
use ds_source::SyntheticSource;
use tracing::{error, info, warn};

/// DataSampler latency run recorder.
#[derive(Parser)]
#[command(name = "ds-runner", about = "DataSampler latency run recorder")]
struct Cli {
    /// Configuration file path (JSON).
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,

    /// Override the number of producer ticks.
    #[arg(long)]
    samples: Option<u64>,

    /// Override the histogram bucket count.
    #[arg(long)]
    bins: Option<usize>,
}

/// Pull samples until the producer goes away, then hand the run back.
fn ingest_loop(mut run: RunData, rx: Receiver<Sample>) -> RunData {
    let mut progress = 0usize;
    while let Ok(sample) = rx.recv() {
        if let Err(e) = run.record_latency(sample) {
            warn!("[{}] {e}", run.name());
            continue;
        }
        progress += 1;
        if progress % 10 == 0
            && let Some(summary) = run.summary()
        {
            info!("[{}] {summary}", run.name());
        }
    }
    run
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration and apply CLI overrides
    let mut config: SamplerConfig = ds_core::config::load_config(&cli.config)?;
    if let Some(n) = cli.samples {
        config.sample_limit = Some(n);
    }
    if let Some(n) = cli.bins {
        config.max_bins = Some(n);
    }
    config.validate()?;

    // 2. Initialize logging
    let log_dir = cli.log_dir.clone().or_else(|| config.log_path());
    let _log_guard =
        ds_core::logging::init_logging(&cli.log_level, log_dir.as_deref(), &config.module_name());

    info!("ds-runner starting, config={}, log_level={}", cli.config.display(), cli.log_level);

    // 3. Create the run and attach the recorder
    let mut run = RunData::new(
        config.run_name(),
        now_us(),
        config.emit_interval_sec,
        config.effective_max_bins(),
    );
    let recorder = match &config.record_path {
        Some(path) => Some(Recorder::spawn(path, run.subscribe())?),
        None => None,
    };
    run.begin(config.run_name(), now_us());

    // 4. Start producer and ingest thread
    let (tx, rx) = crossbeam_channel::unbounded::<Sample>();
    let interval = Duration::from_secs_f64(config.emit_interval_sec);
    let source = SyntheticSource::new(config.source.clone());
    let mut producer =
        tokio::spawn(ds_source::run_timer(source, interval, tx, config.sample_limit));
    let ingest = tokio::task::spawn_blocking(move || ingest_loop(run, rx));

    info!("recording, press Ctrl+C to stop");

    // 5. Wait for the producer to finish or a shutdown signal
    tokio::select! {
        res = &mut producer => {
            match res {
                Ok(sent) => info!("producer finished, {sent} sample(s) sent"),
                Err(e) => error!("producer task failed: {e}"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            producer.abort();
        }
    }

    // 6. End the run, persist, and verify the snapshot reloads
    let mut run = ingest.await?;
    run.end(now_us());

    match run.summary() {
        Some(summary) => {
            info!("[{}] final: {summary} (loss {:.1}%)", run.name(), summary.loss_ratio() * 100.0)
        }
        None => warn!("[{}] no samples recorded", run.name()),
    }

    if let Some(path) = &config.snapshot_path {
        store::save_json(&run, path)?;
        let reloaded = store::load_json(path)?;
        if reloaded.summary() != run.summary() {
            error!("snapshot at {} does not reload to the same statistics", path.display());
        }
    }
    if let Some(path) = &config.archive_path {
        store::save_archive(&run, path)?;
    }

    // The recorder drains until the run, its last sender, is gone.
    drop(run);
    if let Some(recorder) = recorder {
        let path = recorder.path().display().to_string();
        let lines = recorder.join()?;
        info!("recorder wrote {lines} sample line(s) to {path}");
    }

    info!("ds-runner done");
    Ok(())
}
