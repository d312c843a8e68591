//! Daemon entry point for the Dgraph MCP server.
//!
//! Loads configuration from the command line and environment, probes the
//! Dgraph alpha, optionally seeds the movie dataset, and serves MCP over stdio
//! or streamable HTTP.

mod backend;
mod config;
mod logging;

use dgraph_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::backend::build_control;
use crate::config::{DgraphMcpConfig, Transport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = DgraphMcpConfig::from_args()?;
    logging::init(&config.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting dgraph-mcpd");

    let control = build_control(&config).await.inspect_err(|err| {
        error!(endpoint = %config.dgraph.endpoint, error = %err, "dgraph is unreachable");
    })?;

    if config.seed_movies {
        let outcome = control.seed_movies(&CancellationToken::new()).await?;
        info!(?outcome, "movie dataset ready");
    }

    match config.transport {
        Transport::Stdio => serve_stdio(control).await,
        Transport::Http => {
            serve_streamable_http(control, McpHttpServerConfig::new(config.http_addr)).await
        }
    }
}
