use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// The terminal belongs to the viewer, so its logs go to a file.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub target: LogTarget,
}

/// Flushes buffered log lines when dropped; hold it until exit.
pub struct LoggingGuard(#[allow(dead_code)] WorkerGuard);

pub fn init_logging(cfg: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(&cfg.filter_directives));

    let (writer, guard) = match &cfg.target {
        LogTarget::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .with_context(|| format!("log path {} has no parent", path.display()))?;
            let file_name = path
                .file_name()
                .with_context(|| format!("log path {} has no file name", path.display()))?
                .to_string_lossy()
                .into_owned();
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name)
                .build(dir)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_appender::non_blocking(appender)
        }
    };

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(cfg.target == LogTarget::Stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to install log subscriber")?;
    Ok(LoggingGuard(guard))
}
