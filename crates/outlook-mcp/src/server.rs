//! MCP server implementation
//!
//! This module provides the tool registry and the JSON-RPC dispatch for the
//! Outlook MCP server. Transport concerns (reading and writing lines) live in
//! [`crate::transport`].

use crate::clients::GraphError;
use crate::types::*;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// MCP server error types.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid tool arguments; no request was sent
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Upstream failure (token acquisition or Graph)
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for MCP server operations.
pub type McpServerResult<T> = Result<T, McpServerError>;

impl McpServerError {
    /// Machine-readable error kind reported in tool results.
    pub fn kind(&self) -> &'static str {
        match self {
            McpServerError::ToolNotFound(_) => "not_found",
            McpServerError::InvalidParams(_) => "validation",
            McpServerError::Graph(GraphError::Auth(_)) => "auth",
            McpServerError::Graph(GraphError::Api { .. }) => "graph_api",
            McpServerError::Graph(GraphError::RequestFailed(_)) => "request",
            McpServerError::Graph(GraphError::InvalidResponse(_)) => "invalid_response",
        }
    }

    /// Render the error as a failed tool result.
    ///
    /// Graph errors carry the upstream status and body unchanged.
    pub fn to_tool_result(&self) -> ToolResult {
        let mut error = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });

        match self {
            McpServerError::Graph(GraphError::Api { status, body }) => {
                error["status"] = serde_json::json!(status);
                error["body"] = body.clone();
            }
            McpServerError::Graph(GraphError::Auth(auth)) => {
                error["code"] = serde_json::json!(auth.error_code());
                if let Some(status) = auth.status_code() {
                    error["status"] = serde_json::json!(status);
                }
            }
            _ => {}
        }

        ToolResult::json_error(serde_json::json!({
            "result": null,
            "error": error,
        }))
    }
}

/// Trait for tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult>;
}

/// Context for tool execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// JSON-RPC request ID
    pub request_id: Option<RequestId>,

    /// Correlation ID for log lines of this call
    pub correlation_id: Uuid,
}

impl ToolContext {
    /// Create a context with a fresh correlation ID.
    pub fn new(request_id: Option<RequestId>) -> Self {
        Self {
            request_id,
            correlation_id: Uuid::now_v7(),
        }
    }

    /// Create an empty context.
    pub fn empty() -> Self {
        Self::new(None)
    }
}

/// Outlook MCP server.
///
/// Holds the tool registry and answers JSON-RPC requests.
pub struct McpServer {
    /// Server info
    info: ServerInfo,

    /// Server capabilities
    capabilities: ServerCapabilities,

    /// Registered tools, by name
    tools: Arc<RwLock<BTreeMap<String, Arc<dyn Tool>>>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities {
                    list_changed: false,
                }),
            },
            tools: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create with the default server name and crate version.
    pub fn outlook() -> Self {
        Self::new("outlook-mcp", env!("CARGO_PKG_VERSION"))
    }

    /// Register a tool. A tool with the same name is replaced.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        let mut tools = self.tools.write().await;
        if tools.insert(name.clone(), tool).is_some() {
            warn!("Replaced previously registered tool {}", name);
        }
    }

    /// Register multiple tools.
    pub async fn register_tools(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register_tool(tool).await;
        }
    }

    /// Get all tool definitions, sorted by name.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        tools.values().map(|t| t.definition()).collect()
    }

    /// Get tools of one group.
    pub async fn list_tools_by_group(&self, group: ToolGroup) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        tools
            .values()
            .map(|t| t.definition())
            .filter(|d| d.group == Some(group))
            .collect()
    }

    /// Execute a tool.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let tool = {
            let tools = self.tools.read().await;
            tools
                .get(name)
                .cloned()
                .ok_or_else(|| McpServerError::ToolNotFound(name.to_string()))?
        };

        // Clients may omit `arguments` for tools without parameters.
        let arguments = if arguments.is_null() {
            serde_json::json!({})
        } else {
            arguments
        };

        let span = info_span!(
            "tool_call",
            tool = %name,
            correlation_id = %context.correlation_id
        );

        async {
            debug!("Executing tool");
            let result = tool.execute(arguments, context).await;
            match &result {
                Ok(r) if r.is_error => warn!("Tool reported an error"),
                Ok(_) => info!("Tool completed"),
                Err(e) => warn!(kind = e.kind(), "Tool failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Handle an MCP request. Notifications yield no response.
    pub async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        let Some(id) = request.id.clone() else {
            debug!("Received notification {}", request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => McpResponse::success(id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(id).await,
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => McpResponse::error(id, McpError::method_not_found(&request.method)),
        };

        Some(response)
    }

    fn handle_initialize(&self, id: RequestId) -> McpResponse {
        McpResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": self.capabilities,
                "serverInfo": self.info
            }),
        )
    }

    async fn handle_tools_list(&self, id: RequestId) -> McpResponse {
        let tools = self.list_tools().await;
        McpResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
    ) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let call: ToolCall = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        let context = ToolContext::new(Some(id.clone()));

        let result = match self.call_tool(&call.name, call.arguments, &context).await {
            Ok(result) => result,
            Err(McpServerError::ToolNotFound(name)) => {
                return McpResponse::error(
                    id,
                    McpError::invalid_params(format!("Unknown tool: {}", name)),
                )
            }
            Err(e) => e.to_tool_result(),
        };

        match serde_json::to_value(result) {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
        }
    }

    /// Get server info.
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Get server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }
}
