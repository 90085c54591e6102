//! Configuration management for sigma-query.
//!
//! Handles loading configuration from TOML files and environment variables,
//! and turns it into the immutable [`ClientConfig`] handed to the client.

use crate::error::{Result, SigmaError};
use crate::query::PollPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default Stripe API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "STRIPE_API_KEY";

/// Default timeout for a single HTTP request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure, as read from the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Run polling settings.
    #[serde(default)]
    pub poll: PollConfig,
}

/// Remote API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the query and file endpoints.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// API key (prefer the environment variable over storing it here).
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// Polling configuration, in file-friendly units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wait before the second status check, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Maximum number of status checks before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Multiplier applied to the interval after each non-terminal status.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound for a single wait, in milliseconds.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    2_000
}

fn default_max_attempts() -> u32 {
    30
}

fn default_backoff_factor() -> f64 {
    1.0
}

fn default_max_interval_ms() -> u64 {
    30_000
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
            backoff_factor: default_backoff_factor(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

impl PollConfig {
    /// Converts to a validated [`PollPolicy`].
    ///
    /// A `max_interval_ms` below `interval_ms` is raised to it, so a long
    /// fixed interval works without also setting the cap.
    pub fn to_policy(&self) -> Result<PollPolicy> {
        let max_interval_ms = self.max_interval_ms.max(self.interval_ms);
        PollPolicy::new(
            Duration::from_millis(self.interval_ms),
            self.max_attempts,
        )?
        .with_backoff(self.backoff_factor, Duration::from_millis(max_interval_ms))
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sigma-query")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SigmaError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            SigmaError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Builds the client configuration.
    ///
    /// `api_key` (from the command line or environment) takes precedence over
    /// the key stored in the file.
    pub fn to_client_config(&self, api_key: Option<String>) -> Result<ClientConfig> {
        let api_key = api_key
            .or_else(|| self.api.api_key.clone())
            .ok_or_else(|| {
                SigmaError::config(format!(
                    "No API key configured. Set {API_KEY_ENV} or api.api_key in the config file"
                ))
            })?;

        Ok(ClientConfig::new(api_key)?
            .with_base_url(&self.api.base_url)?
            .with_timeout(Duration::from_secs(self.api.timeout_secs))
            .with_poll_policy(self.poll.to_policy()?))
    }
}

/// Validated, immutable settings for [`crate::api::HttpSigmaApi`] and
/// [`crate::QueryExecutor`].
#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    api_key: String,
    timeout: Duration,
    poll: PollPolicy,
}

impl ClientConfig {
    /// Creates a config for the default API host.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SigmaError::config("API key must not be empty"));
        }

        Ok(Self {
            base_url: parse_base_url(DEFAULT_API_BASE_URL)?,
            api_key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll: PollPolicy::default(),
        })
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the polling policy.
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("poll", &self.poll)
            .finish()
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| SigmaError::config(format!("Invalid base URL '{base_url}': {e}")))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(SigmaError::config(format!(
            "Invalid base URL '{base_url}'. Expected an http or https URL"
        )));
    }

    Ok(url)
}
