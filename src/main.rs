//! Line chat server - Entry Point
//!
//! Starts the TCP listener and ChatServer actor, accepting connections
//! until Ctrl-C.

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use linechat::config::{parse_or_exit, ServerArgs, DEFAULT_LOG_FILTER};
use linechat::serve;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=linechat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args: ServerArgs = parse_or_exit();
    let addr = args.bind_addr();

    // Start TCP listener
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        error!("Failed to set up server on {}: {}", addr, e);
        e
    })?;
    info!("Chat server listening on {}", addr);

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            ctrl_c.cancel();
        }
    });

    serve(listener, shutdown).await;

    info!("Chat server stopped");
    Ok(())
}
