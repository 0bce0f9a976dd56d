use anyhow::Context;
use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_DIR: &str = "log";
pub const LOG_FILE_PREFIX: &str = "neurodoc.log";
const DEFAULT_FILTER: &str = "neurodoc_core=info,neurodoc_cli=info";

/// Routes `tracing` output to a daily log file under `data_dir/log`. The
/// terminal is left to the session output. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init(data_dir: &Path) -> Result<WorkerGuard> {
    let log_dir = data_dir.join(LOG_DIR);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("failed to install the log subscriber")?;

    Ok(guard)
}
