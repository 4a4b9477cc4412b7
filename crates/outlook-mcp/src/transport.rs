//! Stdio transport
//!
//! Newline-delimited JSON-RPC: one message per input line, one response per
//! output line. Stdout is the protocol channel, so nothing else may write to
//! it.

use crate::server::McpServer;
use crate::types::{McpError, McpRequest, McpResponse, RequestId};
use serde_json::Value;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

/// Stdio transport for the MCP server.
pub struct StdioTransport {
    server: Arc<McpServer>,
}

impl StdioTransport {
    /// Create a transport for the given server.
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }

    /// Serve stdin/stdout until stdin is closed.
    pub async fn run(&self) -> io::Result<()> {
        info!("Starting stdio transport");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve any line-oriented reader and writer. Lines are handled in order.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let encoded = serde_json::to_string(&response)?;
                writer.write_all(encoded.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
                debug!("Sent response for id {}", response.id);
            }
        }

        debug!("EOF reached on input");
        Ok(())
    }

    /// Handle one raw message. Notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to parse JSON-RPC message: {}", e);
                return Some(McpResponse::error(
                    RequestId::Null,
                    McpError::parse_error().with_data(Value::String(e.to_string())),
                ));
            }
        };

        // Keep the id for the error reply even when the envelope is malformed.
        let id = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value::<RequestId>(id).ok())
            .unwrap_or(RequestId::Null);

        match serde_json::from_value::<McpRequest>(value) {
            Ok(request) => self.server.handle_request(request).await,
            Err(e) => {
                error!("Invalid JSON-RPC request: {}", e);
                Some(McpResponse::error(
                    id,
                    McpError::invalid_request().with_data(Value::String(e.to_string())),
                ))
            }
        }
    }
}
