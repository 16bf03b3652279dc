//! Application configuration management.
//!
//! Two layers live here: `SessionConfig`, the in-process tunables the
//! session manager is constructed with, and `Config`, a small file-backed
//! record (base URL override, last used username) stored at
//! `~/.config/campus-client/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "campus-client";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// HTTP request timeout in seconds for regular API calls.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for the token refresh call. Shorter than the general timeout so
/// a hung refresh cannot stall every caller waiting on it.
const REFRESH_TIMEOUT_SECS: u64 = 10;

/// Auto-refresh fires this many seconds before the token expiry claim.
const REFRESH_MARGIN_SECS: u64 = 60;

/// Floor for the auto-refresh delay. Handles tokens already near expiry.
const REFRESH_FLOOR_SECS: u64 = 5;

/// Cap on how long a caller waits for another task's in-flight refresh.
const REFRESH_WAIT_CAP_SECS: u64 = 15;

/// Idle window after which the session is cleared automatically.
const IDLE_TIMEOUT_SECS: u64 = 600;

/// Delay between session loss and invoking the expiry hook. Observed in the
/// shipped client as ~1.2s; kept configurable rather than second-guessed.
const EXPIRY_REDIRECT_DELAY_MS: u64 = 1200;

/// CSRF double-submit cookie name (readable, set by the server).
const CSRF_COOKIE: &str = "XSRF-TOKEN";

/// Header the CSRF cookie value is echoed into on mutating requests.
const CSRF_HEADER: &str = "X-CSRF-Token";

/// Tunables for [`SessionManager`](crate::auth::SessionManager).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the backend, e.g. `https://api.campus.example`.
    pub base_url: String,
    pub request_timeout: Duration,
    pub refresh_timeout: Duration,
    pub refresh_margin: Duration,
    pub refresh_floor: Duration,
    pub refresh_wait_cap: Duration,
    /// `None` disables idle auto-logout.
    pub idle_timeout: Option<Duration>,
    pub expiry_redirect_delay: Duration,
    pub csrf_cookie: String,
    pub csrf_header: String,
}

impl SessionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            refresh_timeout: Duration::from_secs(REFRESH_TIMEOUT_SECS),
            refresh_margin: Duration::from_secs(REFRESH_MARGIN_SECS),
            refresh_floor: Duration::from_secs(REFRESH_FLOOR_SECS),
            refresh_wait_cap: Duration::from_secs(REFRESH_WAIT_CAP_SECS),
            idle_timeout: Some(Duration::from_secs(IDLE_TIMEOUT_SECS)),
            expiry_redirect_delay: Duration::from_millis(EXPIRY_REDIRECT_DELAY_MS),
            csrf_cookie: CSRF_COOKIE.to_string(),
            csrf_header: CSRF_HEADER.to_string(),
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    pub fn with_expiry_redirect_delay(mut self, delay: Duration) -> Self {
        self.expiry_redirect_delay = delay;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let config = SessionConfig::new("https://api.campus.example/");
        assert_eq!(
            config.endpoint("/users/login"),
            "https://api.campus.example/users/login"
        );

        let config = SessionConfig::new("https://api.campus.example");
        assert_eq!(
            config.endpoint("/users/refresh"),
            "https://api.campus.example/users/refresh"
        );
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("http://localhost:3000");
        assert_eq!(config.refresh_margin, Duration::from_secs(60));
        assert_eq!(config.refresh_floor, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.expiry_redirect_delay, Duration::from_millis(1200));
        assert_eq!(config.csrf_cookie, "XSRF-TOKEN");
    }

    #[test]
    fn test_builder_overrides() {
        let config = SessionConfig::new("http://localhost:3000")
            .with_idle_timeout(None)
            .with_refresh_margin(Duration::from_secs(30));
        assert!(config.idle_timeout.is_none());
        assert_eq!(config.refresh_margin, Duration::from_secs(30));
    }
}
