//! Outlook MCP tools
//!
//! Each tool validates its arguments, issues one or more Microsoft Graph
//! requests through the shared [`GraphClient`] and wraps the response as
//! `{"result": ..., "error": null}`.

pub mod args;
pub mod calendar;
pub mod contacts;
pub mod email;
pub mod folders;

pub use calendar::*;
pub use contacts::*;
pub use email::*;
pub use folders::*;

use crate::clients::GraphClient;
use crate::server::Tool;
use std::sync::Arc;

/// Get all Outlook tools, sharing one Graph client.
///
/// # Example
///
/// ```rust,no_run
/// use outlook_connect::StaticToken;
/// use outlook_mcp::clients::{GraphClient, GraphEndpoint};
/// use outlook_mcp::tools::outlook_tools;
/// use std::sync::Arc;
///
/// let client = GraphClient::new(
///     reqwest::Client::new(),
///     GraphEndpoint::default(),
///     Arc::new(StaticToken::new("token")),
/// );
/// let tools = outlook_tools(Arc::new(client));
/// println!("Available tools: {}", tools.len());
/// ```
pub fn outlook_tools(client: Arc<GraphClient>) -> Vec<Arc<dyn Tool>> {
    let mut tools = Vec::new();

    // Email tools (6)
    tools.extend(email_tools(client.clone()));

    // Contact tools (5)
    tools.extend(contact_tools(client.clone()));

    // Calendar tools (9)
    tools.extend(calendar_tools(client.clone()));

    // Folder tools (6)
    tools.extend(folder_tools(client));

    tools
}
