//! Upstream HTTP clients.
//!
//! - `config`: Graph endpoint, Nango settings and timeouts loaded from the environment
//! - `graph`: Authorized Microsoft Graph client used by every tool
//!
//! Token acquisition lives in the `outlook-connect` crate; the Graph client
//! only depends on its `TokenProvider` trait.

pub mod config;
pub mod graph;

pub use config::{ConfigError, GraphEndpoint, ServiceConfig};
pub use graph::{GraphClient, GraphError, GraphResult};
