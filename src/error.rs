//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// protocol errors (reported back to the issuing client).
#[derive(Debug, Error)]
pub enum AppError {
    /// Line framing error, including over-long lines (fatal)
    #[error("Line codec error: {0}")]
    Line(#[from] tokio_util::codec::LinesCodecError),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// No registered session has the requested username
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The line did not parse into a known command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

/// Message send errors
///
/// Occurs when attempting to send replies to a session whose writer is gone.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
