// This is the entry point of the Slides MCP server.
//
// **Architecture Overview:**
// - `core/` = Domain logic (charts, slide requests, sample data)
// - `infra/` = Implementations of core traits (Google Slides and Drive over HTTP)
// - `mcp/` = Protocol adapter (JSON-RPC over stdio, tool handlers)
//
// This file's job is to:
// 1. Load configuration
// 2. Build credentials and API clients
// 3. Wire services into tool handlers
// 4. Serve MCP on stdin/stdout until the host closes the stream

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "mcp/mcp_layer.rs"]
mod mcp;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::core::slides::{PresentationRegistry, SlidesService, ThemeService};
use crate::infra::google::{GoogleCredentials, GoogleDriveClient, GoogleSlidesClient};
use crate::mcp::server::McpServer;
use crate::mcp::tools::{ChartToolHandler, SlidesToolHandler, ThemeToolHandler, ToolDispatcher};

const SERVER_NAME: &str = "google-slides";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // stdout carries protocol frames, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = ServerConfig::from_env();
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")?;

    let credentials = GoogleCredentials::from_source(&config.credentials, http.clone())
        .await
        .context("failed to load Google credentials")?;

    let slides = Arc::new(GoogleSlidesClient::new(http.clone(), credentials.clone()));
    let drive = Arc::new(GoogleDriveClient::new(http, credentials));
    let registry = Arc::new(PresentationRegistry::new());

    let slides_service = Arc::new(SlidesService::new(
        slides.clone(),
        drive.clone(),
        registry.clone(),
    ));
    let theme_service = ThemeService::new(slides, drive, registry);

    let dispatcher = ToolDispatcher::new(vec![
        Arc::new(SlidesToolHandler::new(slides_service.clone())),
        Arc::new(ChartToolHandler::new(slides_service)),
        Arc::new(ThemeToolHandler::new(theme_service)),
    ]);
    tracing::info!(
        tools = dispatcher.list().len(),
        timeout_secs = config.http_timeout.as_secs(),
        "Slides MCP server ready on stdio"
    );

    let server = McpServer::new(dispatcher, SERVER_NAME, env!("CARGO_PKG_VERSION"));
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("stdio transport failed")?;

    Ok(())
}
