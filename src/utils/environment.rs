use std::path::PathBuf;

use anyhow::{Context, Result};

pub const APP_DIR_NAME: &str = "inbox-transcript";

/// Per-user config directory (`~/.config/inbox-transcript` on Linux)
pub fn get_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Failed to get platform config directory")?;
    Ok(base.join(APP_DIR_NAME))
}

/// Directory for interactive-session log files
pub fn get_log_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Failed to get platform cache directory")?;
    Ok(base.join(APP_DIR_NAME).join("logs"))
}
