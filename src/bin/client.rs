//! Terminal chat client - Entry Point
//!
//! Connects to a linechat server, joins with the given username and relays
//! stdin to the server until it sends `exit`.

use std::process;

use tracing::error;
use tracing_subscriber::EnvFilter;

use linechat::client;
use linechat::config::{parse_or_exit, ClientArgs};

/// Log filter when `RUST_LOG` is unset; chat output owns stdout
const CLIENT_LOG_FILTER: &str = "linechat=warn";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(CLIENT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: ClientArgs = parse_or_exit();

    let stream = match client::connect(&args).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Connection to {}:{} failed: {}", args.address, args.port, e);
            eprintln!("Unable to connect to server");
            process::exit(1);
        }
    };

    if let Err(e) = client::run(stream, &args.username).await {
        eprintln!("Connection lost: {}", e);
        process::exit(1);
    }
}
