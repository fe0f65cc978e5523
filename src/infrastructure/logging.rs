//! Logging system configuration and initialization
//!
//! This module provides the logging setup with:
//! - Configuration based log level control (overridable with `RUST_LOG`)
//! - Console output on stderr so stdout stays free for progress output
//! - Optional file output with structured JSON formatting
//! - Local timezone timestamps

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::APP_DIR_NAME;

const LOG_FILE_NAME: &str = "archiver.log";

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Local wall clock time with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Directory log files are written to
pub fn get_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
        .join(APP_DIR_NAME)
        .join("logs")
}

/// Builds the filter: `RUST_LOG` wins, otherwise the configured level plus
/// per-module overrides (unless the level is `trace`).
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&config.level);

        if !config.level.to_lowercase().contains("trace") {
            for (module, level) in &config.module_filters {
                match format!("{module}={level}").parse() {
                    Ok(directive) => filter = filter.add_directive(directive),
                    Err(e) => eprintln!("Ignoring invalid log filter {module}={level}: {e}"),
                }
            }
        }

        filter
    })
}

/// Initialize logging with custom configuration
///
/// Calling this twice is harmless: the second call reports an error instead of
/// replacing the installed subscriber.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let log_dir = get_log_directory();

    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let file_appender = rolling::daily(&log_dir, LOG_FILE_NAME);
        let (file_writer, file_guard) = non_blocking(file_appender);

        // Store the guard globally to prevent it from being dropped
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        let file_layer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_ansi(false)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false)
                .boxed()
        };
        layers.push(file_layer);
    }

    if config.console_output {
        layers.push(
            fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .boxed(),
        );
    }

    Registry::default()
        .with(layers)
        .with(build_env_filter(config))
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log directory: {:?}", log_dir);
        info!("JSON format: {}", config.json_format);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_is_app_scoped() {
        let log_dir = get_log_directory();
        assert!(log_dir.ends_with(PathBuf::from(APP_DIR_NAME).join("logs")));
    }

    #[test]
    fn test_no_output_is_rejected() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..LoggingConfig::default()
        };
        assert!(init_logging_with_config(&config).is_err());
    }
}
