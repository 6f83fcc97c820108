//! Logging initialization
//!
//! Console output goes to stderr, file output goes through a non-blocking
//! rolling appender. `RUST_LOG` takes precedence over the configured level.

use crate::config::{LogFormat, LogRotation, LoggingConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, RollingFileAppender},
};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Base name of the log file inside the log directory
pub const LOG_FILE_NAME: &str = "mgo-rs.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber.
///
/// The returned guard flushes buffered file output on drop and must be held
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = build_env_filter(&config.level);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if config.console {
        layers.push(format_layer(config.format, std::io::stderr, true));
    }

    if let Some(ref dir) = config.directory {
        ensure_log_dir(dir)?;
        let (writer, file_guard) =
            tracing_appender::non_blocking(file_appender(dir, config.rotation));
        layers.push(format_layer(config.format, writer, false));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        level = %config.level,
        console = config.console,
        directory = ?config.directory,
        "Logging initialized"
    );

    Ok(guard)
}

/// `RUST_LOG` if set and valid, else the configured level, else `info`
pub fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(ansi)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

fn file_appender(dir: &Path, rotation: LogRotation) -> RollingFileAppender {
    match rotation {
        LogRotation::Daily => rolling::daily(dir, LOG_FILE_NAME),
        LogRotation::Hourly => rolling::hourly(dir, LOG_FILE_NAME),
        LogRotation::Never => rolling::never(dir, LOG_FILE_NAME),
    }
}

/// Create the log directory if missing
fn ensure_log_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_log_dir_creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_log_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // idempotent
        ensure_log_dir(&nested).unwrap();
    }

    #[test]
    fn test_env_filter_from_level() {
        let filter = build_env_filter("debug");
        assert!(!filter.to_string().is_empty());
    }
}
