//! Error types for token acquisition
//!
//! Every failure to obtain a Graph access token from the connection broker
//! maps onto one of these variants. They are fatal for the tool call that
//! triggered them.

use thiserror::Error;

/// Token acquisition error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more connection settings are not configured
    #[error("Missing required environment variables for Nango connection: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    /// The broker could not be reached (DNS, connect, timeout)
    #[error("Connection broker unreachable: {0}")]
    BrokerUnreachable(String),

    /// The broker answered with a non-success status
    #[error("Connection broker rejected the request ({status}): {body}")]
    BrokerRejected {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The broker response was not the expected JSON document
    #[error("Invalid connection broker response: {0}")]
    InvalidBrokerResponse(String),

    /// The connection exists but carries no access token
    #[error("Access token not found in credentials")]
    MissingAccessToken,
}

/// Result type for token acquisition.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Upstream HTTP status, when the broker returned one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AuthError::BrokerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get error code for tool results.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials(_) => "MISSING_CREDENTIALS",
            AuthError::BrokerUnreachable(_) => "BROKER_UNREACHABLE",
            AuthError::BrokerRejected { .. } => "BROKER_REJECTED",
            AuthError::InvalidBrokerResponse(_) => "INVALID_BROKER_RESPONSE",
            AuthError::MissingAccessToken => "MISSING_ACCESS_TOKEN",
        }
    }
}
