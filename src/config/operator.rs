//! # Operator Configuration
//!
//! Operator-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BUNNY_API_URL, DEFAULT_DEPENDENCY_BACKOFF_ATTEMPTS, DEFAULT_DEPENDENCY_BACKOFF_FACTOR,
    DEFAULT_DEPENDENCY_BACKOFF_START_MS, DEFAULT_METRICS_PORT,
};
use crate::controller::backoff::BackoffSettings;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing `BUNNY_CDN_API_KEY` environment variable")]
    MissingApiKey,
}

/// Credentials for the Bunny CDN API.
///
/// Passed explicitly to [`crate::provider::BunnyClient::new`].
#[derive(Clone)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub api_url: String,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"***")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// `text` selects human-readable output, anything else is JSON
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }

    /// Format selected by the `LOG_FORMAT` environment variable
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }
}

/// Operator-level configuration
///
/// Everything except the API key has a default and can be overridden via
/// environment variables.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub credentials: ProviderCredentials,
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// Backoff used while waiting for referenced resources to become ready
    pub dependency_backoff: BackoffSettings,
    /// Restrict watches to one namespace, all namespaces when `None`
    pub watch_namespace: Option<String>,
}

impl OperatorConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("BUNNY_CDN_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            credentials: ProviderCredentials {
                api_key,
                api_url: lookup("BUNNY_CDN_API_URL")
                    .unwrap_or_else(|| DEFAULT_BUNNY_API_URL.to_string()),
            },
            metrics_port: parse_or_default(&lookup, "METRICS_PORT", DEFAULT_METRICS_PORT),
            dependency_backoff: BackoffSettings::new(
                parse_or_default(
                    &lookup,
                    "DEPENDENCY_BACKOFF_START_MS",
                    DEFAULT_DEPENDENCY_BACKOFF_START_MS,
                ),
                parse_or_default(
                    &lookup,
                    "DEPENDENCY_BACKOFF_FACTOR",
                    DEFAULT_DEPENDENCY_BACKOFF_FACTOR,
                ),
                parse_or_default(
                    &lookup,
                    "DEPENDENCY_BACKOFF_ATTEMPTS",
                    DEFAULT_DEPENDENCY_BACKOFF_ATTEMPTS,
                ),
            ),
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty()),
        })
    }
}

/// Read a key and parse it, falling back to `default` when absent or invalid
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
