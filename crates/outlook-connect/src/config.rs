//! Nango connection configuration.
//!
//! Settings are read from the environment. Nothing here is validated at load
//! time: a server with an incomplete configuration still starts, and the
//! missing variables are reported on the first token request.

use crate::error::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};

/// Environment variable holding the Nango connection id.
pub const ENV_CONNECTION_ID: &str = "NANGO_CONNECTION_ID";
/// Environment variable holding the Nango integration (provider config key).
pub const ENV_INTEGRATION_ID: &str = "NANGO_INTEGRATION_ID";
/// Environment variable holding the Nango API base URL.
pub const ENV_BASE_URL: &str = "NANGO_BASE_URL";
/// Environment variable holding the Nango secret key.
pub const ENV_SECRET_KEY: &str = "NANGO_SECRET_KEY";

/// Connection settings for the Nango broker.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NangoConfig {
    /// Connection id of the Outlook account.
    pub connection_id: Option<String>,

    /// Integration id, sent as `provider_config_key`.
    pub integration_id: Option<String>,

    /// Broker base URL (e.g., "https://api.nango.dev").
    pub base_url: Option<String>,

    /// Secret key used as bearer token against the broker.
    pub secret_key: Option<String>,
}

impl std::fmt::Debug for NangoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NangoConfig")
            .field("connection_id", &self.connection_id)
            .field("integration_id", &self.integration_id)
            .field("base_url", &self.base_url)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Borrowed view of a complete configuration.
#[derive(Debug, Clone, Copy)]
pub struct NangoCredentials<'a> {
    pub connection_id: &'a str,
    pub integration_id: &'a str,
    pub base_url: &'a str,
    pub secret_key: &'a str,
}

impl NangoConfig {
    /// Build a complete configuration.
    pub fn new(
        connection_id: impl Into<String>,
        integration_id: impl Into<String>,
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            connection_id: Some(connection_id.into()),
            integration_id: Some(integration_id.into()),
            base_url: Some(base_url.into()),
            secret_key: Some(secret_key.into()),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `NANGO_CONNECTION_ID`
    /// - `NANGO_INTEGRATION_ID`
    /// - `NANGO_BASE_URL`
    /// - `NANGO_SECRET_KEY`
    ///
    /// Empty values count as unset.
    pub fn from_env() -> Self {
        Self {
            connection_id: env_non_empty(ENV_CONNECTION_ID),
            integration_id: env_non_empty(ENV_INTEGRATION_ID),
            base_url: env_non_empty(ENV_BASE_URL),
            secret_key: env_non_empty(ENV_SECRET_KEY),
        }
    }

    /// Names of the variables that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (ENV_CONNECTION_ID, &self.connection_id),
            (ENV_INTEGRATION_ID, &self.integration_id),
            (ENV_BASE_URL, &self.base_url),
            (ENV_SECRET_KEY, &self.secret_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    /// Check whether every setting is present.
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Borrow all four settings, or report which ones are missing.
    pub fn credentials(&self) -> AuthResult<NangoCredentials<'_>> {
        match (
            self.connection_id.as_deref(),
            self.integration_id.as_deref(),
            self.base_url.as_deref(),
            self.secret_key.as_deref(),
        ) {
            (Some(connection_id), Some(integration_id), Some(base_url), Some(secret_key))
                if self.is_complete() =>
            {
                Ok(NangoCredentials {
                    connection_id,
                    integration_id,
                    base_url,
                    secret_key,
                })
            }
            _ => Err(AuthError::MissingCredentials(self.missing())),
        }
    }
}

impl NangoCredentials<'_> {
    /// Connection endpoint URL: `{base_url}/connection/{connection_id}`.
    pub fn connection_url(&self) -> String {
        format!(
            "{}/connection/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(self.connection_id)
        )
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
