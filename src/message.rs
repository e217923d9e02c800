//! Line protocol definitions
//!
//! Client → server lines are parsed into [`Command`]s; server → client
//! frames are typed [`Reply`] values rendered to text by [`Reply::encode`].
//!
//! Every reply ends with the sentinel line (`\r\n`) that tells the client
//! display loop a response is complete. Unsolicited messages from other
//! users are preceded by the push marker line so the client can tell them
//! apart from replies to its own commands.

use crate::error::AppError;

/// End-of-response marker line
pub const SENTINEL: &str = "\r\n";

/// Line announcing an unsolicited message from another user
pub const PUSH_MARKER: &str = "start";

/// Line telling the client to close and terminate
pub const EXIT_MARKER: &str = "exit";

/// Keyword introducing a broadcast or direct message
pub const MSG_KEYWORD: &str = "msg";

/// Usage text sent in reply to `help`
pub const HELP_TEXT: &str = "msg \"text\" : send message to all clients\n\
msg \"text\" user : send message to a specific client\n\
online : list all online users\n\
quit : exit chatroom\n";

/// Client → Server command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show usage
    Help,
    /// List the usernames of every joined session
    ListOnline,
    /// Leave the chat and close the connection
    Quit,
    /// Send text to every other session
    Broadcast(String),
    /// Send text to one named session
    Unicast { text: String, recipient: String },
    /// Anything else; carries the raw line
    Invalid(String),
}

impl Command {
    /// Parse one line (terminator already stripped) into a command
    ///
    /// Keywords are matched exactly and case-sensitively. A message looks like
    /// `msg "<text>" [recipient]`; the text is whatever sits between the first
    /// pair of double quotes and may be empty. Tokens after the recipient are
    /// ignored. Never fails: unrecognised input becomes [`Command::Invalid`].
    pub fn parse(line: &str) -> Self {
        match line {
            "help" => Command::Help,
            "online" => Command::ListOnline,
            "quit" => Command::Quit,
            _ => parse_message(line).unwrap_or_else(|| Command::Invalid(line.to_string())),
        }
    }
}

fn parse_message(line: &str) -> Option<Command> {
    let line = line.trim_start();
    let keyword_end = line.find(char::is_whitespace).unwrap_or(line.len());
    let (keyword, rest) = line.split_at(keyword_end);
    if keyword != MSG_KEYWORD {
        return None;
    }

    let quoted = rest.trim_start().strip_prefix('"')?;
    let (text, rest) = quoted.split_once('"')?;

    let command = match rest.split_whitespace().next() {
        Some(recipient) => Command::Unicast {
            text: text.to_string(),
            recipient: recipient.to_string(),
        },
        None => Command::Broadcast(text.to_string()),
    };
    Some(command)
}

/// Server → Client frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Usage text
    Help,
    /// Usernames of the joined sessions, in join order
    Online(Vec<String>),
    /// Acknowledgment of a delivered message
    Sent,
    /// Message from another user
    Push { from: String, text: String },
    /// Direct message to an unknown username
    UserNotFound,
    /// Unparseable command
    InvalidCommand,
    /// Server-initiated termination
    Exit,
}

impl Reply {
    /// Render the frame exactly as it goes on the wire
    pub fn encode(&self) -> String {
        match self {
            Reply::Help => format!("{HELP_TEXT}{SENTINEL}"),
            Reply::Online(names) => {
                let mut out = String::new();
                for name in names {
                    out.push_str(name);
                    out.push('\n');
                }
                out.push_str(SENTINEL);
                out
            }
            Reply::Sent => format!("msg sent\n{SENTINEL}"),
            Reply::Push { from, text } => format!("{PUSH_MARKER}\n{from}:{text}\n{SENTINEL}"),
            Reply::UserNotFound => format!("user not found\n{SENTINEL}"),
            Reply::InvalidCommand => format!("Invalid command\n{SENTINEL}"),
            Reply::Exit => format!("{EXIT_MARKER}\n"),
        }
    }
}

/// Convert AppError to Reply for client notification
impl From<AppError> for Reply {
    fn from(err: AppError) -> Self {
        match err {
            AppError::UserNotFound(_) => Reply::UserNotFound,
            // Fatal errors are not typically converted (connection closes)
            _ => Reply::InvalidCommand,
        }
    }
}
