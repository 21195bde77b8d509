//! Configuration loading
//!
//! Settings come from a TOML file (default: `<config_dir>/inbox-transcript/config.toml`),
//! with `INBOX_BASE_URL` and `INBOX_TOKEN` overriding the server section. A missing file
//! means defaults. Every reconciliation tolerance is a config value rather than a
//! hard-coded number.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::utils::get_config_dir;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const ENV_BASE_URL: &str = "INBOX_BASE_URL";
pub const ENV_TOKEN: &str = "INBOX_TOKEN";

/// Placeholder substituted with the percent-encoded conversation id
pub const CONVERSATION_PLACEHOLDER: &str = "{conversation}";

/// Upper bound for every time tolerance, in seconds
pub const MAX_TOLERANCE_SECS: i64 = 86_400;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub endpoints: EndpointConfig,
    pub sync: SyncConfig,
    pub reconcile: ReconcileConfig,
    pub echo: EchoConfig,
    pub tui: TuiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Unset leaves the HTTP client's default (no explicit timeout)
    pub request_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            token: None,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub list_messages: String,
    pub send: String,
    pub resync: String,
    pub rebuild: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            list_messages: "/api/whatsapp/conversations/{conversation}/messages".to_string(),
            send: "/api/whatsapp/send".to_string(),
            resync: "/api/whatsapp/conversations/{conversation}/sync".to_string(),
            rebuild: "/api/whatsapp/conversations/rebuild".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub poll_interval_ms: u64,
    /// Delay before the one follow-up fetch after a successful send
    pub followup_delay_ms: u64,
    /// Delay between the resync call and the single first-load retry
    pub resync_retry_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 5000, followup_delay_ms: 1500, resync_retry_delay_ms: 2000 }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn followup_delay(&self) -> Duration {
        Duration::from_millis(self.followup_delay_ms)
    }

    pub fn resync_retry_delay(&self) -> Duration {
        Duration::from_millis(self.resync_retry_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// How far apart a provisional echo and its server copy may be
    pub confirm_window_secs: i64,
    /// Normalized content is compared up to this many characters
    pub content_prefix_chars: usize,
    /// Width of the dedup time bucket
    pub dedup_bucket_secs: i64,
    pub max_messages: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            confirm_window_secs: 90,
            content_prefix_chars: 200,
            dedup_bucket_secs: 3,
            max_messages: 500,
        }
    }
}

impl ReconcileConfig {
    pub fn confirm_window(&self) -> chrono::Duration {
        seconds_or_max(self.confirm_window_secs)
    }

    pub fn dedup_bucket_millis(&self) -> i64 {
        self.dedup_bucket_secs.saturating_mul(1000)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Identical resubmissions inside this window are suppressed
    pub resubmit_window_secs: i64,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self { resubmit_window_secs: 60 }
    }
}

impl EchoConfig {
    pub fn resubmit_window(&self) -> chrono::Duration {
        seconds_or_max(self.resubmit_window_secs)
    }
}

/// Out-of-range values only reach here when validation was skipped
fn seconds_or_max(secs: i64) -> chrono::Duration {
    chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Rows from the bottom within which the viewer counts as anchored
    pub anchor_threshold_rows: u32,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { anchor_threshold_rows: 2 }
    }
}

impl AppConfig {
    /// Reject values that would stall polling or break bucketing
    pub fn validate(&self) -> Result<()> {
        if self.sync.poll_interval_ms == 0 {
            bail!("sync.poll_interval_ms must be greater than zero");
        }
        if self.reconcile.dedup_bucket_secs <= 0 {
            bail!("reconcile.dedup_bucket_secs must be greater than zero");
        }
        if self.reconcile.max_messages == 0 {
            bail!("reconcile.max_messages must be greater than zero");
        }
        if self.reconcile.confirm_window_secs < 0 || self.echo.resubmit_window_secs < 0 {
            bail!("time windows cannot be negative");
        }
        let tolerances = [
            ("reconcile.dedup_bucket_secs", self.reconcile.dedup_bucket_secs),
            ("reconcile.confirm_window_secs", self.reconcile.confirm_window_secs),
            ("echo.resubmit_window_secs", self.echo.resubmit_window_secs),
        ];
        for (name, secs) in tolerances {
            if secs > MAX_TOLERANCE_SECS {
                bail!("{} cannot exceed {} seconds", name, MAX_TOLERANCE_SECS);
            }
        }
        if self.server.base_url.trim().is_empty() {
            bail!("server.base_url cannot be empty");
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = env::var(ENV_BASE_URL)
            && !base_url.trim().is_empty()
        {
            self.server.base_url = base_url;
        }
        if let Ok(token) = env::var(ENV_TOKEN)
            && !token.trim().is_empty()
        {
            self.server.token = Some(token);
        }
    }
}

/// Default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILENAME))
}

/// Parse config from TOML text (no env overrides, no validation)
pub fn parse_config(text: &str) -> Result<AppConfig> {
    toml::from_str(text).context("Failed to parse config TOML")
}

/// Load config from `path` (or the default location), apply env overrides, validate
pub fn load_config(path: Option<&Path>) -> Result<(AppConfig, PathBuf)> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    let mut config = if path.exists() {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&text).with_context(|| format!("Invalid config file: {}", path.display()))?
    } else {
        AppConfig::default()
    };

    config.apply_env_overrides();
    config.validate().with_context(|| format!("Invalid configuration in {}", path.display()))?;

    Ok((config, path))
}
