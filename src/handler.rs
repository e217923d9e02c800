//! TCP connection handler
//!
//! Handles individual client connections: the join handshake, the command
//! loop, and teardown, talking to the ChatServer over its command channel.
//!
//! A connection moves through three states. While joining, the first line
//! read is taken as the username; if the peer goes away first, nothing was
//! registered and nothing needs removing. Once active, every line is parsed
//! and dispatched in arrival order. On close, the session is removed from
//! the registry (a no-op after `quit`) before the connection is released.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{Command, Reply};
use crate::server::ServerCommand;
use crate::transport::{LineReader, LineWriter};
use crate::types::SessionId;

/// Capacity of each session's reply queue
pub const REPLY_BUFFER_SIZE: usize = 32;

/// Handle a new TCP connection
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    let (reader, writer) = stream.into_split();
    serve_session(reader, writer, cmd_tx, shutdown).await
}

/// Run one session over an arbitrary byte stream
///
/// Returns once the session has been removed from the registry and the
/// writer has shut the stream down.
pub async fn serve_session<R, W>(
    reader: R,
    writer: W,
    cmd_tx: mpsc::Sender<ServerCommand>,
    shutdown: CancellationToken,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut lines = LineReader::new(reader);
    let session_id = SessionId::next();

    // Joining: first line is the username
    let username = tokio::select! {
        line = lines.read_line() => match line? {
            Some(username) => username,
            None => {
                debug!("Connection {} closed before joining", session_id);
                return Ok(());
            }
        },
        _ = shutdown.cancelled() => return Ok(()),
    };

    // Create channel for server -> client replies
    let (reply_tx, mut reply_rx) = mpsc::channel::<Reply>(REPLY_BUFFER_SIZE);

    if cmd_tx
        .send(ServerCommand::Join {
            session_id,
            username,
            sender: reply_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register session {} - server closed", session_id);
        return Err(AppError::ChannelSend);
    }

    // Spawn write task (Reply -> stream)
    let mut write_task = tokio::spawn(async move {
        let mut out = LineWriter::new(writer);
        while let Some(reply) = reply_rx.recv().await {
            if let Err(e) = out.write_all(reply.encode().as_bytes()).await {
                warn!("Write failed for session {}: {}", session_id, e);
                break;
            }
        }
        // Queue closed: the session has left the registry
        let _ = out.shutdown().await;
        debug!("Write task ended for {}", session_id);
    });

    // Spawn read task (stream -> ServerCommand)
    let cmd_tx_read = cmd_tx.clone();
    let mut read_task = tokio::spawn(async move {
        loop {
            match lines.read_line().await {
                Ok(Some(line)) => {
                    let command = Command::parse(&line);
                    let quit = command == Command::Quit;
                    debug!("Session {} sent {:?}", session_id, command);

                    if cmd_tx_read
                        .send(ServerCommand::Dispatch {
                            session_id,
                            command,
                        })
                        .await
                        .is_err()
                    {
                        debug!("Server closed, ending read task for {}", session_id);
                        break;
                    }
                    if quit {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Session {} reached end of stream", session_id);
                    break;
                }
                Err(e) => {
                    warn!("Read failed for session {}: {}", session_id, e);
                    break;
                }
            }
        }
    });

    // Active until the peer stops sending, the writer fails, or shutdown
    let writer_done = tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", session_id);
            false
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", session_id);
            read_task.abort();
            true
        }
        _ = shutdown.cancelled() => {
            read_task.abort();
            let _ = cmd_tx
                .send(ServerCommand::Dispatch {
                    session_id,
                    command: Command::Quit,
                })
                .await;
            false
        }
    };

    // Closed
    let _ = cmd_tx.send(ServerCommand::Disconnect { session_id }).await;
    if !writer_done {
        let _ = write_task.await;
    }

    info!("Session {} closed", session_id);

    Ok(())
}
