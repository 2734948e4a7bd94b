//! Client configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:5007/api/v1/stream";

/// Environment variable overriding the endpoint.
pub const ENDPOINT_ENV: &str = "STREAMCHAT_URL";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported endpoint scheme: {0} (expected ws or wss)")]
    UnsupportedScheme(String),
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the chat backend.
    endpoint: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a config for the given endpoint.
    ///
    /// # Errors
    /// Returns error if the endpoint is not a `ws`/`wss` URL.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(endpoint)?;
        match url.scheme() {
            "ws" | "wss" => Ok(Self {
                endpoint: url.into(),
            }),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Load from the process environment.
    ///
    /// # Errors
    /// Returns error if `STREAMCHAT_URL` is set to an invalid endpoint.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using a custom variable lookup.
    ///
    /// # Errors
    /// Returns error if the endpoint variable holds an invalid endpoint.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(ENDPOINT_ENV) {
            Some(endpoint) if !endpoint.trim().is_empty() => Self::with_endpoint(endpoint.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Re-check a config built by deserialization.
    ///
    /// # Errors
    /// Returns error if the endpoint is not a `ws`/`wss` URL.
    pub fn validate(self) -> Result<Self, ConfigError> {
        Self::with_endpoint(&self.endpoint)
    }

    /// The endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
