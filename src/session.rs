//! Session struct definition
//!
//! Represents a joined client: its identity, chosen username and the
//! channel feeding its connection writer.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::Reply;
use crate::types::SessionId;

/// Joined session information
///
/// Dropping a `Session` drops its reply sender; once the writer has drained
/// the queue it shuts the connection down.
#[derive(Debug)]
pub struct Session {
    /// Unique identifier for this connection
    pub id: SessionId,
    /// Username chosen at join (not verified unique)
    pub username: String,
    /// Server → Client reply channel
    pub sender: mpsc::Sender<Reply>,
}

impl Session {
    /// Create a new session with the given ID, username and sender channel
    pub fn new(id: SessionId, username: String, sender: mpsc::Sender<Reply>) -> Self {
        Self {
            id,
            username,
            sender,
        }
    }

    /// Send a reply to this session
    ///
    /// Waits for queue capacity. Returns an error if the channel is closed
    /// (connection writer gone).
    pub async fn send(&self, reply: Reply) -> Result<(), SendError> {
        self.sender
            .send(reply)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }
}
