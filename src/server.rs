//! ChatServer Actor implementation
//!
//! The central actor that owns the session registry and routes commands.
//! Uses the Actor pattern with mpsc channels for message passing.
//!
//! Commands are processed strictly one at a time. A broadcast therefore
//! completes its whole fan-out before any join, quit or other command is
//! looked at, and commands from one connection are routed in arrival order.
//! Replies go into bounded per-session queues; a full queue makes the actor
//! wait, which stalls all routing until that recipient catches up.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::AppError;
use crate::message::{Command, Reply};
use crate::registry::Registry;
use crate::session::Session;
use crate::types::SessionId;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Join handshake completed
    Join {
        session_id: SessionId,
        username: String,
        sender: mpsc::Sender<Reply>,
    },
    /// Route a parsed command from a joined session
    Dispatch {
        session_id: SessionId,
        command: Command,
    },
    /// Connection ended without `quit`
    Disconnect {
        session_id: SessionId,
    },
}

/// The main ChatServer actor
///
/// Owns the registry exclusively; every registry read or write happens
/// inside `handle_command`.
pub struct ChatServer {
    /// All joined sessions
    registry: Registry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: Registry::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Join {
                session_id,
                username,
                sender,
            } => {
                self.handle_join(session_id, username, sender);
            }
            ServerCommand::Disconnect { session_id } => {
                self.handle_disconnect(session_id);
            }
            ServerCommand::Dispatch {
                session_id,
                command,
            } => match command {
                Command::Help => self.handle_help(session_id).await,
                Command::ListOnline => self.handle_list_online(session_id).await,
                Command::Quit => self.handle_quit(session_id).await,
                Command::Broadcast(text) => self.handle_broadcast(session_id, text).await,
                Command::Unicast { text, recipient } => {
                    self.handle_unicast(session_id, text, recipient).await
                }
                Command::Invalid(line) => self.handle_invalid(session_id, line).await,
            },
        }
    }

    /// Register a session that completed the join handshake
    fn handle_join(&mut self, session_id: SessionId, username: String, sender: mpsc::Sender<Reply>) {
        info!("Session {} joined as '{}'", session_id, username);
        self.registry.add(Session::new(session_id, username, sender));
        debug!("Total sessions: {}", self.registry.len());
    }

    /// Remove a session whose connection went away
    ///
    /// No-op if the session already quit.
    fn handle_disconnect(&mut self, session_id: SessionId) {
        if let Some(session) = self.registry.remove(session_id) {
            info!("Session {} ('{}') disconnected", session_id, session.username);
            debug!("Total sessions: {}", self.registry.len());
        }
    }

    async fn handle_help(&mut self, session_id: SessionId) {
        let Some(session) = self.registry.get(session_id) else {
            return;
        };

        let _ = session.send(Reply::Help).await;
    }

    async fn handle_list_online(&mut self, session_id: SessionId) {
        let Some(session) = self.registry.get(session_id) else {
            return;
        };

        let names = self
            .registry
            .snapshot()
            .iter()
            .map(|s| s.username.clone())
            .collect();

        let _ = session.send(Reply::Online(names)).await;
    }

    /// Handle explicit quit
    ///
    /// The session leaves the registry before its exit marker is queued, and
    /// dropping it afterwards closes the reply channel so the writer shuts the
    /// connection down.
    async fn handle_quit(&mut self, session_id: SessionId) {
        let Some(session) = self.registry.remove(session_id) else {
            return;
        };

        info!("Session {} ('{}') quit", session_id, session.username);

        let _ = session.send(Reply::Exit).await;
        debug!("Total sessions: {}", self.registry.len());
    }

    /// Handle broadcast to every joined session
    async fn handle_broadcast(&mut self, session_id: SessionId, text: String) {
        let Some(sender) = self.registry.get(session_id) else {
            return;
        };

        debug!(
            "Session {} broadcasting to {} sessions",
            session_id,
            self.registry.len() - 1
        );

        for session in self.registry.snapshot() {
            let reply = if session.id == session_id {
                Reply::Sent
            } else {
                Reply::Push {
                    from: sender.username.clone(),
                    text: text.clone(),
                }
            };
            let _ = session.send(reply).await;
        }
    }

    /// Handle direct message to one named session
    async fn handle_unicast(&mut self, session_id: SessionId, text: String, recipient: String) {
        let Some(sender) = self.registry.get(session_id) else {
            return;
        };

        // Duplicate usernames resolve to the earliest joined session
        let Some(target) = self.registry.find_by_name(&recipient) else {
            debug!("Session {} messaged unknown user '{}'", session_id, recipient);
            let _ = sender.send(AppError::UserNotFound(recipient).into()).await;
            return;
        };

        debug!("Session {} messaging session {}", session_id, target.id);

        let _ = target
            .send(Reply::Push {
                from: sender.username.clone(),
                text,
            })
            .await;
        let _ = sender.send(Reply::Sent).await;
    }

    async fn handle_invalid(&mut self, session_id: SessionId, line: String) {
        let Some(session) = self.registry.get(session_id) else {
            return;
        };

        debug!("Session {} sent invalid command '{}'", session_id, line);
        let _ = session.send(AppError::InvalidCommand(line).into()).await;
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::error::TryRecvError;

    use super::*;

    fn start() -> mpsc::Sender<ServerCommand> {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(ChatServer::new(rx).run());
        tx
    }

    async fn join(
        tx: &mpsc::Sender<ServerCommand>,
        username: &str,
    ) -> (SessionId, mpsc::Receiver<Reply>) {
        let session_id = SessionId::next();
        let (sender, receiver) = mpsc::channel(32);
        tx.send(ServerCommand::Join {
            session_id,
            username: username.to_string(),
            sender,
        })
        .await
        .unwrap();
        (session_id, receiver)
    }

    async fn dispatch(tx: &mpsc::Sender<ServerCommand>, session_id: SessionId, line: &str) {
        tx.send(ServerCommand::Dispatch {
            session_id,
            command: Command::parse(line),
        })
        .await
        .unwrap();
    }

    /// Round-trip through the actor so every earlier command has been routed
    async fn online(
        tx: &mpsc::Sender<ServerCommand>,
        session_id: SessionId,
        rx: &mut mpsc::Receiver<Reply>,
    ) -> Vec<String> {
        dispatch(tx, session_id, "online").await;
        match rx.recv().await {
            Some(Reply::Online(names)) => names,
            other => panic!("expected online listing, got {:?}", other),
        }
    }

    fn push(from: &str, text: &str) -> Reply {
        Reply::Push {
            from: from.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_help() {
        let tx = start();
        let (alice, mut alice_rx) = join(&tx, "alice").await;

        dispatch(&tx, alice, "help").await;

        assert_eq!(alice_rx.recv().await, Some(Reply::Help));
    }

    #[tokio::test]
    async fn test_list_online_in_join_order() {
        let tx = start();
        let (alice, mut alice_rx) = join(&tx, "alice").await;
        let (_bob, _bob_rx) = join(&tx, "bob").await;

        assert_eq!(online(&tx, alice, &mut alice_rx).await, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_broadcast_coverage() {
        let tx = start();
        let (_a, mut a_rx) = join(&tx, "a").await;
        let (_b, mut b_rx) = join(&tx, "b").await;
        let (_c, mut c_rx) = join(&tx, "c").await;
        let (s, mut s_rx) = join(&tx, "s").await;

        dispatch(&tx, s, "msg \"T\"").await;

        for rx in [&mut a_rx, &mut b_rx, &mut c_rx] {
            assert_eq!(rx.recv().await, Some(push("s", "T")));
        }
        assert_eq!(s_rx.recv().await, Some(Reply::Sent));

        online(&tx, s, &mut s_rx).await;
        for rx in [&mut a_rx, &mut b_rx, &mut c_rx] {
            assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        }
    }

    #[tokio::test]
    async fn test_unicast_delivers_to_recipient() {
        let tx = start();
        let (alice, mut alice_rx) = join(&tx, "alice").await;
        let (_bob, mut bob_rx) = join(&tx, "bob").await;
        let (_carol, mut carol_rx) = join(&tx, "carol").await;

        dispatch(&tx, alice, "msg \"hi\" bob").await;

        assert_eq!(bob_rx.recv().await, Some(push("alice", "hi")));
        assert_eq!(alice_rx.recv().await, Some(Reply::Sent));

        online(&tx, alice, &mut alice_rx).await;
        assert_eq!(carol_rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(bob_rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_unicast_unknown_user() {
        let tx = start();
        let (carol, mut carol_rx) = join(&tx, "carol").await;
        let (_bob, mut bob_rx) = join(&tx, "bob").await;

        dispatch(&tx, carol, "msg \"yo\" dave").await;

        assert_eq!(carol_rx.recv().await, Some(Reply::UserNotFound));

        online(&tx, carol, &mut carol_rx).await;
        assert_eq!(bob_rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_unicast_duplicate_name_first_joined_wins() {
        let tx = start();
        let (alice, mut alice_rx) = join(&tx, "alice").await;
        let (_bob1, mut bob1_rx) = join(&tx, "bob").await;
        let (_bob2, mut bob2_rx) = join(&tx, "bob").await;

        dispatch(&tx, alice, "msg \"hi\" bob").await;

        assert_eq!(bob1_rx.recv().await, Some(push("alice", "hi")));
        assert_eq!(alice_rx.recv().await, Some(Reply::Sent));

        online(&tx, alice, &mut alice_rx).await;
        assert_eq!(bob2_rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_unicast_to_self() {
        let tx = start();
        let (alice, mut alice_rx) = join(&tx, "alice").await;

        dispatch(&tx, alice, "msg \"note\" alice").await;

        assert_eq!(alice_rx.recv().await, Some(push("alice", "note")));
        assert_eq!(alice_rx.recv().await, Some(Reply::Sent));
    }

    #[tokio::test]
    async fn test_invalid_command() {
        let tx = start();
        let (alice, mut alice_rx) = join(&tx, "alice").await;

        dispatch(&tx, alice, "dance").await;

        assert_eq!(alice_rx.recv().await, Some(Reply::InvalidCommand));
    }

    #[tokio::test]
    async fn test_quit_removes_session_and_closes_channel() {
        let tx = start();
        let (alice, mut alice_rx) = join(&tx, "alice").await;
        let (bob, mut bob_rx) = join(&tx, "bob").await;

        dispatch(&tx, alice, "quit").await;

        assert_eq!(alice_rx.recv().await, Some(Reply::Exit));
        assert_eq!(alice_rx.recv().await, None);
        assert_eq!(online(&tx, bob, &mut bob_rx).await, vec!["bob"]);

        // Commands from a departed session are dropped
        dispatch(&tx, alice, "msg \"late\"").await;
        online(&tx, bob, &mut bob_rx).await;
        assert_eq!(bob_rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_disconnect_removes_session() {
        let tx = start();
        let (alice, mut alice_rx) = join(&tx, "alice").await;
        let (bob, _bob_rx) = join(&tx, "bob").await;

        tx.send(ServerCommand::Disconnect { session_id: bob })
            .await
            .unwrap();
        // Repeated removal is a no-op
        tx.send(ServerCommand::Disconnect { session_id: bob })
            .await
            .unwrap();

        assert_eq!(online(&tx, alice, &mut alice_rx).await, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_broadcast_skips_departed_sessions() {
        let tx = start();
        let (alice, mut alice_rx) = join(&tx, "alice").await;
        let (bob, mut bob_rx) = join(&tx, "bob").await;

        tx.send(ServerCommand::Disconnect { session_id: bob })
            .await
            .unwrap();
        dispatch(&tx, alice, "msg \"anyone?\"").await;

        assert_eq!(alice_rx.recv().await, Some(Reply::Sent));
        assert_eq!(bob_rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_registry_consistency_under_concurrency() {
        let tx = start();

        let mut tasks = Vec::new();
        for i in 0..32 {
            let tx = tx.clone();
            tasks.push(tokio::spawn(async move {
                let name = format!("user{}", i);
                let (id, mut rx) = join(&tx, &name).await;
                match i % 3 {
                    0 => {
                        dispatch(&tx, id, "quit").await;
                        // Broadcasts from others may arrive before the exit marker
                        let mut exited = false;
                        while let Some(reply) = rx.recv().await {
                            exited = reply == Reply::Exit;
                        }
                        assert!(exited);
                        None
                    }
                    1 => {
                        tx.send(ServerCommand::Disconnect { session_id: id })
                            .await
                            .unwrap();
                        None
                    }
                    _ => {
                        dispatch(&tx, id, "msg \"hello\"").await;
                        Some((name, rx))
                    }
                }
            }));
        }

        let mut expected = Vec::new();
        let mut receivers = Vec::new();
        for task in tasks {
            if let Some((name, rx)) = task.await.unwrap() {
                expected.push(name);
                receivers.push(rx);
            }
        }

        let (observer, mut observer_rx) = join(&tx, "observer").await;
        let mut names = online(&tx, observer, &mut observer_rx).await;
        names.retain(|n| n != "observer");
        names.sort();
        expected.sort();
        assert_eq!(names, expected);
    }
}
