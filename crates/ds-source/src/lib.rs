//! # ds-source
//!
//! Synthetic, timer-driven latency producer.
//!
//! Every tick consumes one identifier. A tick's sample may be "lost in
//! transit" with the configured probability, which shows up downstream as an
//! identifier gap. Latencies are uniform around a configured mean; the sample
//! arrives at tick time and was emitted `latency` seconds earlier.

use std::time::Duration;

use crossbeam_channel::Sender;
use ds_core::config::SourceConfig;
use ds_core::sample::Sample;
use ds_core::time_util::{now_us, secs_to_us};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Seeded latency generator.
#[derive(Debug)]
pub struct SyntheticSource {
    config: SourceConfig,
    rng: StdRng,
    next_id: u64,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng,
            next_id: 1,
        }
    }

    /// Produce the sample for the tick at `now_us`, or `None` if it was lost.
    pub fn next_sample(&mut self, now_us: u64) -> Option<Sample> {
        let identifier = self.next_id;
        self.next_id += 1;

        let drop_probability = self.config.drop_probability;
        if drop_probability > 0.0 && self.rng.random::<f64>() < drop_probability {
            debug!("sample #{identifier} dropped");
            return None;
        }

        let u: f64 = self.rng.random_range(-1.0..1.0);
        let latency = (self.config.mean_latency_sec + self.config.jitter_sec * u).max(0.0);
        let emitted_at_us = now_us.saturating_sub(secs_to_us(latency));
        Some(Sample::new(identifier, latency, emitted_at_us, now_us))
    }

    /// Number of ticks consumed so far, lost ones included.
    pub fn ticks(&self) -> u64 {
        self.next_id - 1
    }
}

/// Drive `source` from a tokio interval, pushing samples into `tx`.
///
/// Stops after `limit` ticks, or once the receiving side is gone. Returns the
/// number of samples delivered.
pub async fn run_timer(
    mut source: SyntheticSource,
    interval: Duration,
    tx: Sender<Sample>,
    limit: Option<u64>,
) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sent = 0u64;

    info!("synthetic source started, interval={interval:?} limit={limit:?}");

    loop {
        if let Some(limit) = limit
            && source.ticks() >= limit
        {
            break;
        }
        ticker.tick().await;

        if let Some(sample) = source.next_sample(now_us()) {
            if tx.send(sample).is_err() {
                debug!("sample receiver gone, stopping source");
                break;
            }
            sent += 1;
        }
    }

    info!("synthetic source stopped, {} tick(s), {sent} sample(s) delivered", source.ticks());
    sent
}
