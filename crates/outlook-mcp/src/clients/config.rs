//! Service configuration.
//!
//! Provides centralized configuration for the Graph endpoint, the Nango
//! connection and request timeouts. Configuration is loaded from environment
//! variables with defaults matching the public Microsoft Graph service.

use outlook_connect::NangoConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default Microsoft Graph base URL.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variables.
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<&'static str>),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Configuration for the Outlook MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Microsoft Graph endpoint.
    pub graph: GraphEndpoint,

    /// Nango connection settings.
    pub nango: NangoConfig,

    /// Request timeout in seconds, for Graph and Nango alike.
    pub request_timeout_secs: u64,

    /// Log filter directive (e.g., "info", "outlook_mcp=debug").
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            graph: GraphEndpoint::default(),
            nango: NangoConfig::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `NANGO_CONNECTION_ID`, `NANGO_INTEGRATION_ID`, `NANGO_BASE_URL`,
    ///   `NANGO_SECRET_KEY`: connection broker settings
    /// - `REQUEST_TIMEOUT`: Request timeout in seconds (default: 10)
    /// - `LOG_LEVEL`: Log filter (default: info)
    /// - `GRAPH_BASE_URL`: Graph base URL (default: https://graph.microsoft.com/v1.0)
    ///
    /// An unparsable or zero `REQUEST_TIMEOUT` is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        Ok(Self {
            graph: GraphEndpoint {
                base_url: std::env::var("GRAPH_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(default.graph.base_url),
            },
            nango: NangoConfig::from_env(),
            request_timeout_secs: timeout_or_default(std::env::var("REQUEST_TIMEOUT").ok())?,
            log_level: std::env::var("LOG_LEVEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default.log_level),
        })
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check that everything needed to serve tool calls is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = self.nango.missing();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVars(missing));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "REQUEST_TIMEOUT".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a timeout given in whole seconds.
pub fn parse_timeout(value: &str) -> Result<u64, ConfigError> {
    let secs: u64 = value.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: "REQUEST_TIMEOUT".to_string(),
        message: format!("{}", e),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: "REQUEST_TIMEOUT".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(secs)
}

/// Timeout from an optional setting. Unset or blank means the default.
fn timeout_or_default(value: Option<String>) -> Result<u64, ConfigError> {
    match value.filter(|s| !s.trim().is_empty()) {
        Some(s) => parse_timeout(&s),
        None => Ok(DEFAULT_TIMEOUT_SECS),
    }
}

/// Microsoft Graph endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEndpoint {
    /// Base URL including the API version (e.g., "https://graph.microsoft.com/v1.0").
    pub base_url: String,
}

impl Default for GraphEndpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
        }
    }
}

impl GraphEndpoint {
    /// Create an endpoint for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
