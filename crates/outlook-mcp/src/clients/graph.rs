//! Microsoft Graph client.
//!
//! Thin authorized HTTP wrapper over the Graph v1.0 REST API. Every request
//! carries a bearer token from the configured [`TokenProvider`]. Responses are
//! returned as raw JSON; non-success responses keep their status and body
//! verbatim.

use super::config::GraphEndpoint;
use outlook_connect::{AuthError, TokenProvider};
use reqwest::{header, Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

/// Graph client errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Could not obtain an access token.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Graph returned a non-success status.
    #[error("Graph API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as JSON when it parses, otherwise a JSON string.
        body: Value,
    },

    /// Graph returned a success status with a body that is not JSON.
    #[error("Invalid Graph response: {0}")]
    InvalidResponse(String),
}

/// Result type for Graph calls.
pub type GraphResult<T> = Result<T, GraphError>;

/// Build the HTTP client shared by the Graph client and the token provider.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("outlook-mcp/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Percent-encode a Graph resource ID for use as a single path segment.
pub fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Microsoft Graph client.
#[derive(Clone)]
pub struct GraphClient {
    /// HTTP client instance.
    client: Client,

    /// Graph endpoint configuration.
    endpoint: GraphEndpoint,

    /// Bearer token source.
    tokens: Arc<dyn TokenProvider>,
}

impl GraphClient {
    /// Create a new Graph client.
    pub fn new(client: Client, endpoint: GraphEndpoint, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            endpoint,
            tokens,
        }
    }

    /// Get the endpoint configuration.
    pub fn endpoint(&self) -> &GraphEndpoint {
        &self.endpoint
    }

    /// `GET` a resource or collection.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> GraphResult<Value> {
        self.send(Method::GET, path, query, None).await
    }

    /// `POST` to a collection or action. Actions may have no body.
    pub async fn post(&self, path: &str, body: Option<&Value>) -> GraphResult<Value> {
        self.send(Method::POST, path, &[], body).await
    }

    /// `PATCH` a resource.
    pub async fn patch(&self, path: &str, body: &Value) -> GraphResult<Value> {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    /// `DELETE` a resource.
    pub async fn delete(&self, path: &str) -> GraphResult<Value> {
        self.send(Method::DELETE, path, &[], None).await
    }

    #[instrument(skip(self, query, body), fields(method = %method, path = %path))]
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> GraphResult<Value> {
        let token = self.tokens.access_token().await.map_err(|e| {
            error!("Failed to acquire access token: {}", e);
            GraphError::Auth(e)
        })?;

        let url = self.endpoint.url(path);
        debug!("Graph request {} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }

        request = match body {
            Some(body) => request.json(body),
            // Graph answers 411 to body-less POSTs without a length.
            None if method == Method::POST => request.header(header::CONTENT_LENGTH, "0"),
            None => request,
        };

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response(&self, response: reqwest::Response) -> GraphResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("Graph API error ({}): {}", status.as_u16(), text);
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(GraphError::Api {
                status: status.as_u16(),
                body,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| GraphError::InvalidResponse(e.to_string()))
    }
}
