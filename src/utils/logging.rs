use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use super::environment::get_log_dir;

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to a timestamp-named file so log lines never land on the full-screen viewer
///
/// Filter comes from `RUST_LOG` (default `info`). Returns the log file path.
pub fn init_file_logging() -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_name = format!("{}.log", Local::now().format("%Y%m%d_%H%M%S"));
    let path = log_dir.join(&file_name);
    let appender = rolling::never(&log_dir, file_name);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true),
        )
        .with(env_filter())
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!(path = %path.display(), "File logging initialized");
    Ok(path)
}

/// Log to stderr for one-shot commands, keeping stdout for output
pub fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter())
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
