//! Line-oriented multi-client chat server library
//!
//! A TCP chat service where each connection joins under a username and
//! exchanges newline-delimited text commands with the server.
//!
//! # Protocol
//! - The first line a client sends is its username
//! - `help`, `online`, `quit`, `msg "<text>"` and `msg "<text>" <user>`
//! - Every response ends with a `\r\n` sentinel line
//! - Messages from other users arrive as `start`, `<sender>:<text>`, sentinel
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` owns the session `Registry` and routes every command
//! - Each connection has a `handler` task pair (reader and writer)
//! - No locks needed - the actor processes one command at a time, so a
//!   broadcast is never interleaved with a join, quit or other command
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     linechat::serve(listener, CancellationToken::new()).await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod listener;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use error::{AppError, SendError};
pub use handler::{handle_connection, serve_session};
pub use listener::{accept_loop, serve};
pub use message::{Command, Reply};
pub use registry::Registry;
pub use server::{ChatServer, ServerCommand};
pub use session::Session;
pub use types::SessionId;
