//! Accept loop and server lifecycle
//!
//! Spawns one handler task per accepted connection and tracks them so a
//! shutdown can wait for every session to close.

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::handler::handle_connection;
use crate::server::{ChatServer, ServerCommand};

/// Channel buffer size for server commands
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Run a complete chat server on `listener` until `shutdown` is cancelled
///
/// Starts the ChatServer actor, accepts connections, and on shutdown waits
/// for all handlers and then the actor to finish.
pub async fn serve(listener: TcpListener, shutdown: CancellationToken) {
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let server = tokio::spawn(ChatServer::new(cmd_rx).run());

    accept_loop(listener, cmd_tx, shutdown).await;

    // All command senders are gone; the actor drains and stops
    let _ = server.await;
}

/// Connection accept loop
///
/// No limit is placed on concurrent connections.
pub async fn accept_loop(
    listener: TcpListener,
    cmd_tx: mpsc::Sender<ServerCommand>,
    shutdown: CancellationToken,
) {
    let mut handlers = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let cmd_tx = cmd_tx.clone();
                    let shutdown = shutdown.clone();

                    handlers.spawn(async move {
                        if let Err(e) = handle_connection(stream, cmd_tx, shutdown).await {
                            error!("Connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            },
            // Reap finished handlers
            Some(_) = handlers.join_next(), if !handlers.is_empty() => {}
        }
    }

    info!("Listener stopped, waiting for {} connections", handlers.len());
    while handlers.join_next().await.is_some() {}
}
