//! Bridge configuration management.
//!
//! Holds the remote endpoint, the optional shop directory, and the timeout,
//! paging and retry limits used by the retrieval engine.
//!
//! Configuration is stored at `~/.config/diarybridge/config.json`; a missing
//! file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "diarybridge";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_BASE_URL: &str = "https://manager.example.net/api";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// The diary list page of the platform shows 30 rows.
const DEFAULT_PAGE_SIZE: u32 = 30;

/// Guard against a remote that never signals the last page.
const DEFAULT_MAX_PAGES: u32 = 500;

/// Retries per request after the first attempt.
const DEFAULT_MAX_RETRIES: u32 = 3;

const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;

const DEFAULT_MAX_BACKOFF_MS: u64 = 15_000;

/// Sessions on the platform lapse after ~30 minutes of inactivity.
const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

/// Upper bound for a configured session lifetime: one week.
const MAX_SESSION_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub shop_dir: Option<String>,
    pub request_timeout_secs: u64,
    pub page_size: u32,
    pub max_pages: u32,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// `None` or 0: expiry unknown, detected only when the remote rejects a request.
    pub session_ttl_minutes: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            shop_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            session_ttl_minutes: Some(DEFAULT_SESSION_TTL_MINUTES),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }
        if let Some(minutes) = self.session_ttl_minutes {
            if !(0..=MAX_SESSION_TTL_MINUTES).contains(&minutes) {
                bail!("session_ttl_minutes must be between 0 and {}", MAX_SESSION_TTL_MINUTES);
            }
        }
        Ok(())
    }

    /// Apply `DIARYBRIDGE_BASE_URL` / `DIARYBRIDGE_SHOP_DIR` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DIARYBRIDGE_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(shop) = std::env::var("DIARYBRIDGE_SHOP_DIR") {
            self.shop_dir = Some(shop).filter(|s| !s.trim().is_empty());
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        self.session_ttl_minutes
            .filter(|m| *m > 0)
            .and_then(chrono::Duration::try_minutes)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn log_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }
}
