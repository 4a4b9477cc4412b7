//! Nango connection provider.
//!
//! Resolves Microsoft Graph access tokens through the Nango connection
//! endpoint. Nango owns the OAuth lifecycle; this module only asks it for the
//! current credentials of one connection and extracts the access token.

use crate::config::NangoConfig;
use crate::error::{AuthError, AuthResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument, warn};

/// Source of bearer tokens for Graph requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get an access token valid for at least the next request.
    async fn access_token(&self) -> AuthResult<String>;
}

/// Token provider returning a fixed, pre-issued token.
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Wrap a pre-issued access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> AuthResult<String> {
        Ok(self.token.clone())
    }
}

/// How long a broker-issued token may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCachePolicy {
    /// Ask the broker on every request.
    Disabled,
    /// Reuse the token until `expires_at - skew`. Tokens without an expiry
    /// are never cached.
    UntilExpiry {
        /// Safety margin before the reported expiry.
        skew: Duration,
    },
}

impl Default for TokenCachePolicy {
    fn default() -> Self {
        TokenCachePolicy::UntilExpiry {
            skew: Duration::minutes(5),
        }
    }
}

/// Credentials returned by the broker for one connection.
#[derive(Debug, Clone)]
pub struct ConnectionCredentials {
    /// OAuth access token for Microsoft Graph.
    pub access_token: String,

    /// Expiry reported by the broker, if any.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ConnectionResponse {
    #[serde(default)]
    credentials: Option<RawCredentials>,
}

#[derive(Debug, Deserialize)]
struct RawCredentials {
    #[serde(default)]
    access_token: Option<String>,

    #[serde(default)]
    expires_at: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_after: DateTime<Utc>,
}

/// Nango-backed token provider.
pub struct NangoConnection {
    /// HTTP client instance.
    client: Client,

    /// Broker configuration.
    config: NangoConfig,

    /// Token reuse policy.
    cache_policy: TokenCachePolicy,

    /// Last token with a known expiry.
    cache: RwLock<Option<CachedToken>>,
}

impl NangoConnection {
    /// Create a provider using the given HTTP client.
    ///
    /// The client's timeout applies to broker requests.
    pub fn new(client: Client, config: NangoConfig) -> Self {
        Self {
            client,
            config,
            cache_policy: TokenCachePolicy::default(),
            cache: RwLock::new(None),
        }
    }

    /// Set the token reuse policy.
    pub fn with_cache_policy(mut self, policy: TokenCachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Fetch the connection's credentials from the broker.
    ///
    /// Always asks Nango to refresh the token (`refresh_token=true`).
    #[instrument(skip(self))]
    pub async fn connection_credentials(&self) -> AuthResult<ConnectionCredentials> {
        let creds = self.config.credentials()?;
        let url = creds.connection_url();

        debug!("Requesting credentials for connection {}", creds.connection_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(creds.secret_key)
            .query(&[
                ("provider_config_key", creds.integration_id),
                ("refresh_token", "true"),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Connection broker unreachable: {}", e);
                AuthError::BrokerUnreachable(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::BrokerUnreachable(e.to_string()))?;

        if !status.is_success() {
            warn!("Connection broker error ({}): {}", status.as_u16(), body);
            return Err(AuthError::BrokerRejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ConnectionResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidBrokerResponse(e.to_string()))?;

        let raw = parsed.credentials.ok_or(AuthError::MissingAccessToken)?;
        let access_token = raw
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        let expires_at = raw.expires_at.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| warn!("Ignoring unparsable expires_at {:?}: {}", s, e))
                .ok()
        });

        Ok(ConnectionCredentials {
            access_token,
            expires_at,
        })
    }

    async fn cached_token(&self) -> Option<String> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| Utc::now() < cached.refresh_after)
            .map(|cached| cached.token.clone())
    }
}

#[async_trait]
impl TokenProvider for NangoConnection {
    async fn access_token(&self) -> AuthResult<String> {
        let skew = match self.cache_policy {
            TokenCachePolicy::Disabled => None,
            TokenCachePolicy::UntilExpiry { skew } => Some(skew),
        };

        if skew.is_some() {
            if let Some(token) = self.cached_token().await {
                debug!("Reusing cached access token");
                return Ok(token);
            }
        }

        let credentials = self.connection_credentials().await?;

        if let (Some(skew), Some(expires_at)) = (skew, credentials.expires_at) {
            let refresh_after = expires_at - skew;
            if Utc::now() < refresh_after {
                *self.cache.write().await = Some(CachedToken {
                    token: credentials.access_token.clone(),
                    refresh_after,
                });
            }
        }

        Ok(credentials.access_token)
    }
}
