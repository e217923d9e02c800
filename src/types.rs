//! Basic type definitions for the chat server
//!
//! Provides the `SessionId` newtype used to identify connections.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of session identifiers, shared by every connection in the process
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique session identifier (newtype pattern)
///
/// Identifies one connection for its whole lifetime. Identifiers say
/// nothing about join order; the registry tracks that itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Allocate the next session ID
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
