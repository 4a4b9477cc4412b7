//! # Outlook MCP
//!
//! An MCP (Model Context Protocol) server that exposes Microsoft Outlook
//! operations as tools, backed by the Microsoft Graph API. Access tokens come
//! from the Nango connection broker through the `outlook-connect` crate.
//!
//! ## Overview
//!
//! - **Tools**: 26 tools over mail, contacts, calendars and mail folders
//! - **JSON-RPC**: MCP request dispatch (`initialize`, `ping`, `tools/list`, `tools/call`)
//! - **Transport**: newline-delimited JSON-RPC over stdin/stdout
//! - **Clients**: authorized Graph client and environment configuration
//!
//! ## Available Tools
//!
//! ### Email
//! `send_email`, `create_draft_email`, `send_draft_email`, `get_draft_emails`,
//! `update_draft_email`, `delete_draft_email`
//!
//! ### Contacts
//! `create_contact`, `get_all_contacts`, `get_contact_details`,
//! `update_contact`, `delete_contact`
//!
//! ### Calendar
//! `get_all_calendars`, `get_calendar_details`, `create_calendar`,
//! `update_calendar`, `delete_calendar`, `get_all_events`,
//! `get_event_details`, `create_event`, `delete_event`
//!
//! ### Folders
//! `get_all_folders`, `get_folder_details`, `create_folder`,
//! `update_folder`, `delete_folder`, `get_many_folders`
//!
//! ## Tool Results
//!
//! Every tool answers with a single text block holding
//! `{"result": ..., "error": null}`. Failures set `isError` and carry
//! `{"result": null, "error": {"kind": ..., "message": ...}}`; Graph errors
//! add the upstream `status` and `body` unchanged.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use outlook_connect::StaticToken;
//! use outlook_mcp::clients::{GraphClient, GraphEndpoint};
//! use outlook_mcp::{outlook_tools, McpRequest, McpServer};
//! use std::sync::Arc;
//!
//! async fn list() {
//!     let graph = GraphClient::new(
//!         reqwest::Client::new(),
//!         GraphEndpoint::default(),
//!         Arc::new(StaticToken::new("token")),
//!     );
//!
//!     let server = McpServer::outlook();
//!     server.register_tools(outlook_tools(Arc::new(graph))).await;
//!
//!     let response = server
//!         .handle_request(McpRequest::new(1, "tools/list"))
//!         .await;
//!     println!("{:?}", response);
//! }
//! ```

pub mod clients;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export main types
pub use server::{McpServer, McpServerError, McpServerResult, Tool, ToolContext};
pub use transport::StdioTransport;
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities, ServerInfo,
    ToolCall, ToolCapabilities, ToolDefinition, ToolGroup, ToolResult, PROTOCOL_VERSION,
};

// Re-export tool collections
pub use tools::{calendar_tools, contact_tools, email_tools, folder_tools, outlook_tools};

// Re-export clients
pub use clients::{GraphClient, GraphError, ServiceConfig};
