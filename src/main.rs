//! Weather and Document MCP Server
//!
//! A Model Context Protocol (MCP) server exposing weather lookups and
//! document generation (PDF, DOCX, PNG, Markdown) as tools.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use weather_docs_mcp::config::ServerConfig;
use weather_docs_mcp::mcp::http;
use weather_docs_mcp::mcp::server::McpServer;
use weather_docs_mcp::mcp::tools::ToolHandler;

/// Weather and Document MCP Server
#[derive(Parser)]
#[command(name = "weather-mcp-server")]
#[command(author, version, about = "Weather and Document MCP Server - weather lookups and report generation over MCP")]
struct Cli {
    /// Transport to serve on
    #[arg(long, value_enum, default_value_t = Transport::Http)]
    transport: Transport,

    /// Host to bind the HTTP transport to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind the HTTP transport to
    #[arg(long)]
    port: Option<u16>,

    /// Directory generated documents are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    /// Streamable HTTP on /mcp
    Http,
    /// Line-delimited JSON-RPC on stdin/stdout
    Stdio,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays free for the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = ServerConfig::from_env();
    if let Some(host) = cli.host {
        config.bind_host = host;
    }
    if let Some(port) = cli.port {
        config.bind_port = port;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    if config.api_key().is_err() {
        tracing::warn!("WEATHER_API_TOKEN is not set; weather tools will report a configuration error");
    }

    let addr = config.bind_addr();
    let handler = ToolHandler::new(config).context("Failed to create tool handler")?;
    let server = Arc::new(McpServer::new(handler));

    match cli.transport {
        Transport::Http => http::serve(server, &addr)
            .await
            .with_context(|| format!("HTTP transport on {} failed", addr))?,
        Transport::Stdio => server.run_stdio().await.context("stdio transport failed")?,
    }

    Ok(())
}
