//! Logging setup for the `datashift` binary.
//!
//! Events go to stderr, leaving stdout free for command output. When a log
//! directory is configured a second, plain-text layer writes daily rotated
//! files there.
//!
//! ```no_run
//! use datashift::logging;
//!
//! logging::init("info", None).expect("Failed to initialize logging");
//! tracing::info!("Ready");
//! ```

use anyhow::{Context as _, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const LOG_FILE_PREFIX: &str = "datashift";
const MAX_LOG_FILES: usize = 10;

/// Filter from `RUST_LOG` when set, otherwise from `default_level`.
///
/// # Errors
///
/// Returns error if `default_level` is not a valid filter directive.
pub fn build_filter(default_level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("Invalid log filter: {default_level}"))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, the filter is
/// invalid, or a subscriber is already installed.
pub fn init(default_level: &str, log_dir: Option<&Path>) -> Result<()> {
    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(MAX_LOG_FILES)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .build(dir)
                .context("Failed to create file appender")?;
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_writer(appender),
            )
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(build_filter(default_level)?)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(dir) = log_dir {
        tracing::debug!("Logging initialized, log directory: {}", dir.display());
    }
    Ok(())
}
