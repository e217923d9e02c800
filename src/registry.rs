//! Connection registry
//!
//! The authoritative set of joined sessions.

use crate::session::Session;
use crate::types::SessionId;

/// Registry of joined sessions
///
/// Sessions are kept in the order they were added, which is join order
/// because only the server actor adds them. Usernames are not required to
/// be unique.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: Vec<Session>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session unconditionally
    ///
    /// Duplicate usernames are accepted.
    pub fn add(&mut self, session: Session) {
        self.sessions.push(session);
    }

    /// Remove the session with the given ID
    ///
    /// Returns the removed session, or None if it was not registered.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        Some(self.sessions.remove(index))
    }

    /// Current sessions in join order
    pub fn snapshot(&self) -> Vec<&Session> {
        self.sessions.iter().collect()
    }

    /// First session (in join order) with the given username
    pub fn find_by_name(&self, name: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.username == name)
    }

    /// Look up a session by ID
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if no session is registered
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
