//! Logging initialization
//!
//! | Mode       | Console output                     | Default level |
//! |------------|------------------------------------|---------------|
//! | debug      | human-readable, file and line      | debug         |
//! | production | bunyan JSON                        | info          |
//!
//! When `log_dir` is set, a daily-rolling `vconf.log` is written as well.
//! `RUST_LOG` overrides the configured level for every layer.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::model::config::LoggingParams;

const APP_NAME: &str = "vconf";
const LOG_FILE_NAME: &str = "vconf.log";

/// Guard that keeps the logging system alive.
///
/// Must be held for the lifetime of the process; dropping it flushes
/// buffered file output.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global tracing subscriber from the logging parameters.
pub fn init_logging(params: &LoggingParams) -> anyhow::Result<LoggingGuard> {
    let level = params.level();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if params.is_debug {
        layers.push(Box::new(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter(level)),
        ));
    } else {
        layers.push(Box::new(JsonStorageLayer));
        layers.push(Box::new(
            BunyanFormattingLayer::new(APP_NAME.to_string(), std::io::stdout)
                .with_filter(env_filter(level)),
        ));
    }

    let file_guard = match &params.log_dir {
        Some(dir) => {
            let dir = PathBuf::from(dir);
            std::fs::create_dir_all(&dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(Box::new(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(false)
                    .with_filter(env_filter(level)),
            ));
            Some(guard)
        }
        None => None,
    };

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!(
        level,
        debug = params.is_debug,
        log_dir = ?params.log_dir,
        "logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
