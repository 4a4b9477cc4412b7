//! # Outlook Connect
//!
//! Access token acquisition for Microsoft Graph, delegated to the Nango
//! connection broker.
//!
//! ## Overview
//!
//! - **Config**: `NangoConfig` loaded from `NANGO_*` environment variables
//! - **Provider**: `NangoConnection` asks Nango for a connection's credentials
//!   and extracts the access token, reusing it until shortly before expiry
//! - **Seam**: the `TokenProvider` trait, also implemented by `StaticToken`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use outlook_connect::{NangoConfig, NangoConnection, TokenProvider};
//! use std::time::Duration;
//!
//! async fn token() -> Result<String, outlook_connect::AuthError> {
//!     let client = reqwest::Client::builder()
//!         .timeout(Duration::from_secs(10))
//!         .build()
//!         .unwrap();
//!     let connection = NangoConnection::new(client, NangoConfig::from_env());
//!     connection.access_token().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod nango;

pub use config::{NangoConfig, NangoCredentials};
pub use error::{AuthError, AuthResult};
pub use nango::{
    ConnectionCredentials, NangoConnection, StaticToken, TokenCachePolicy, TokenProvider,
};
