//! Connection configuration.
//!
//! Settings are read from a TOML file, then overridden by environment
//! variables, then by whatever the caller sets explicitly.
//!
//! ```toml
//! host = "https://photos.example.org"
//! username = "display"
//! password = "secret"
//! scan_interval = 60  # seconds
//! timeout = 10        # seconds
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WallDisplayError};

/// Default values.
pub mod defaults {
    /// Polling interval in seconds.
    pub const SCAN_INTERVAL_SECS: u64 = 60;
    /// HTTP request timeout in seconds.
    pub const TIMEOUT_SECS: u64 = 10;
}

/// Environment variable names.
pub mod env_vars {
    pub const HOST: &str = "WALLDISPLAY_HOST";
    pub const USERNAME: &str = "WALLDISPLAY_USERNAME";
    pub const PASSWORD: &str = "WALLDISPLAY_PASSWORD";
    pub const SCAN_INTERVAL: &str = "WALLDISPLAY_SCAN_INTERVAL";
    pub const TIMEOUT: &str = "WALLDISPLAY_TIMEOUT";
    /// Emit JSON log lines instead of the compact format.
    pub const LOG_JSON: &str = "WALLDISPLAY_LOG_JSON";
}

/// Settings for one Piwigo server connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WallDisplayConfig {
    /// Base URL of the Piwigo server, including the scheme
    #[serde(default)]
    pub host: String,
    /// Piwigo user name
    #[serde(default)]
    pub username: String,
    /// Piwigo password
    #[serde(default)]
    pub password: String,
    /// Polling interval in seconds
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_scan_interval() -> u64 {
    defaults::SCAN_INTERVAL_SECS
}

fn default_timeout() -> u64 {
    defaults::TIMEOUT_SECS
}

impl Default for WallDisplayConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            scan_interval: default_scan_interval(),
            timeout: default_timeout(),
        }
    }
}

impl WallDisplayConfig {
    /// Create a configuration with default intervals.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| WallDisplayError::Configuration(format!("Invalid TOML: {}", e)))
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WallDisplayError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(env_vars::HOST) {
            self.host = host;
        }
        if let Some(username) = lookup(env_vars::USERNAME) {
            self.username = username;
        }
        if let Some(password) = lookup(env_vars::PASSWORD) {
            self.password = password;
        }
        if let Some(interval) = lookup(env_vars::SCAN_INTERVAL).and_then(|s| s.parse().ok()) {
            self.scan_interval = interval;
        }
        if let Some(timeout) = lookup(env_vars::TIMEOUT).and_then(|s| s.parse().ok()) {
            self.timeout = timeout;
        }
        self
    }

    /// Check that the configuration can be used to connect.
    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(WallDisplayError::Configuration("host is not set".to_string()));
        }
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(WallDisplayError::Configuration(format!(
                "host must start with http:// or https://, got '{}'",
                host
            )));
        }
        if self.username.is_empty() {
            return Err(WallDisplayError::Configuration(
                "username is not set".to_string(),
            ));
        }
        if self.scan_interval == 0 {
            return Err(WallDisplayError::Configuration(
                "scan_interval must be at least 1 second".to_string(),
            ));
        }
        if self.timeout == 0 {
            return Err(WallDisplayError::Configuration(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Host without surrounding whitespace or trailing slashes.
    pub fn base_url(&self) -> &str {
        self.host.trim().trim_end_matches('/')
    }

    /// Namespace prefix for the unique keys of this connection.
    pub fn controller_name(&self) -> String {
        controller_name(&self.host)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Derive the controller name from a host URL: `https://photos.example.org`
/// becomes `photos_example_org`.
pub fn controller_name(host: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    host.trim_end_matches('/').replace('.', "_")
}
