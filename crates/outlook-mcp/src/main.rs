use clap::Parser;
use outlook_connect::NangoConnection;
use outlook_mcp::clients::config::parse_timeout;
use outlook_mcp::clients::graph::http_client;
use outlook_mcp::clients::{GraphClient, ServiceConfig};
use outlook_mcp::{outlook_tools, McpServer, StdioTransport};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "outlook-mcp")]
#[command(about = "MCP server exposing Outlook mail, contacts, calendars and folders over stdio")]
#[command(version)]
struct Cli {
    /// Log filter directive (e.g. "info", "outlook_mcp=debug")
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Timeout for Graph and Nango requests, in seconds. Overrides
    /// REQUEST_TIMEOUT.
    #[arg(long, value_parser = parse_timeout)]
    request_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::from_env()?;
    if let Some(secs) = cli.request_timeout {
        config.request_timeout_secs = secs;
    }

    let directive = cli
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| config.log_level.clone());

    // Stdout carries the protocol; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    info!("Starting Outlook MCP server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        warn!("{}; tool calls will fail until this is fixed", e);
    }

    let http = http_client(config.timeout())?;
    let tokens = Arc::new(NangoConnection::new(http.clone(), config.nango.clone()));
    let graph = Arc::new(GraphClient::new(http, config.graph.clone(), tokens));

    let server = Arc::new(McpServer::outlook());
    server.register_tools(outlook_tools(graph)).await;
    info!(
        "Registered {} tools, Graph endpoint {}",
        server.list_tools().await.len(),
        config.graph.base_url
    );

    let transport = StdioTransport::new(server);
    if let Err(e) = transport.run().await {
        error!("Transport error: {}", e);
        return Err(e.into());
    }

    info!("Input closed, shutting down");
    Ok(())
}
