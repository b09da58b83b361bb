//! Logging initialization using the `tracing` ecosystem.
//!
//! Console output is always on. When a log directory is given, a daily-rotated
//! file is added behind `tracing-appender`'s non-blocking writer so ingestion
//! never waits on disk. `RUST_LOG` overrides the level passed in.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// Call once, before the first run is created. Keep the returned guard alive
/// for the life of the program; dropping it flushes and stops the file writer.
///
/// - `log_level`: default filter if `RUST_LOG` is unset (e.g. `"info"`)
/// - `log_dir`: optional directory for daily-rotating log files
/// - `module_name`: log file prefix (e.g. `"ds-runner"`)
pub fn init_logging(
    log_level: &str,
    log_dir: Option<&str>,
    module_name: &str,
) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(true);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(env_filter).with(console_layer).init();
        return None;
    };

    let file_appender = tracing_appender::rolling::daily(dir, module_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    Some(guard)
}
