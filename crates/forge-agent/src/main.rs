//! Relay binary entry point.
//!
//! Reads the Gemini API key from the environment, starts the WebSocket
//! relay server, and runs until Ctrl-C.

#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tracing::info;

use forge_llm::GeminiClient;
use forge_server::{Dispatcher, ForgeServer, ServerConfig};

/// Command-line options.
#[derive(Parser, Debug)]
#[command(
    name = "forge-agent",
    about = "WebSocket relay for Gemini-backed code analysis",
    version
)]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (0 picks a free port).
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Log level filter (overridden by `RUST_LOG`).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    forge_core::logging::init_subscriber(&cli.log_level);

    let api_key = std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("GOOGLE_API_KEY"))
        .context("GEMINI_API_KEY (or GOOGLE_API_KEY) must be set")?;

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        ..ServerConfig::default()
    };
    let client = GeminiClient::new(api_key);
    let server = ForgeServer::new(config, Dispatcher::new(client));

    let (addr, handle) = server.listen().await?;
    info!(%addr, "relay ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutting down");
    server.shutdown().graceful_shutdown(vec![handle]).await;
    Ok(())
}
