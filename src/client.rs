//! Terminal chat client
//!
//! Sends the username, forwards stdin lines to the server, and prints
//! server output with a prompt after each complete response.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::config::ClientArgs;
use crate::error::AppError;
use crate::message::{EXIT_MARKER, PUSH_MARKER};
use crate::transport::{LineReader, LineWriter, MAX_LINE_LENGTH};

/// Prompt printed after each complete response
pub const PROMPT: &str = "Chatroom> ";

/// How a line from the server affects the display
#[derive(Debug, PartialEq, Eq)]
pub enum ServerLine<'a> {
    /// Sentinel: the response is complete
    EndOfResponse,
    /// Push marker, not printed
    PushMarker,
    /// Server asked the client to terminate
    Exit,
    /// Ordinary output
    Text(&'a str),
}

impl<'a> ServerLine<'a> {
    /// Classify a line with its terminator already stripped
    pub fn classify(line: &'a str) -> Self {
        match line {
            "" => ServerLine::EndOfResponse,
            PUSH_MARKER => ServerLine::PushMarker,
            EXIT_MARKER => ServerLine::Exit,
            text => ServerLine::Text(text),
        }
    }
}

/// Open the connection to the server named in `args`
pub async fn connect(args: &ClientArgs) -> Result<TcpStream, AppError> {
    Ok(TcpStream::connect((args.address.as_str(), args.port)).await?)
}

/// Join as `username` and run until the server sends `exit` or stdin closes
pub async fn run(stream: TcpStream, username: &str) -> Result<(), AppError> {
    let (reader, writer) = stream.into_split();

    let mut out = LineWriter::new(writer);
    out.write_all(format!("{}\n", username).as_bytes()).await?;

    let mut display = tokio::spawn(async move {
        let mut lines = LineReader::new(reader);
        display_server(&mut lines, &mut tokio::io::stdout()).await
    });

    let mut stdout = tokio::io::stdout();
    stdout.write_all(PROMPT.as_bytes()).await?;
    stdout.flush().await?;

    let mut input = LineReader::unbounded(tokio::io::stdin());
    tokio::select! {
        result = forward_input(&mut input, &mut out) => result?,
        result = &mut display => {
            return result.map_err(|e| AppError::Io(e.into()))?;
        }
    }

    out.shutdown().await?;
    display.abort();
    Ok(())
}

/// Send each input line to the server until the input ends
///
/// `input` should be unbounded; lines longer than the server accepts are
/// logged and skipped.
pub async fn forward_input<R, W>(
    input: &mut LineReader<R>,
    out: &mut LineWriter<W>,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        match input.read_line().await? {
            Some(line) if line.len() > MAX_LINE_LENGTH => {
                warn!("Input line longer than {} bytes skipped", MAX_LINE_LENGTH);
            }
            Some(line) => out.write_all(format!("{}\n", line).as_bytes()).await?,
            None => {
                debug!("Input closed");
                return Ok(());
            }
        }
    }
}

/// Print server output until `exit` or end of stream
///
/// Returns `Ok(())` in both cases.
pub async fn display_server<R, W>(lines: &mut LineReader<R>, out: &mut W) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.read_line().await? {
        match ServerLine::classify(&line) {
            ServerLine::EndOfResponse => out.write_all(PROMPT.as_bytes()).await?,
            ServerLine::PushMarker => {}
            ServerLine::Exit => {
                debug!("Server requested exit");
                return Ok(());
            }
            ServerLine::Text(text) => {
                out.write_all(text.as_bytes()).await?;
                out.write_all(b"\n").await?;
            }
        }
        out.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ServerLine::classify(""), ServerLine::EndOfResponse);
        assert_eq!(ServerLine::classify("start"), ServerLine::PushMarker);
        assert_eq!(ServerLine::classify("exit"), ServerLine::Exit);
        assert_eq!(
            ServerLine::classify("alice:hi"),
            ServerLine::Text("alice:hi")
        );
    }

    #[tokio::test]
    async fn test_display_push_then_exit() {
        let (mut server, client) = tokio::io::duplex(256);
        server
            .write_all(b"msg sent\n\r\nstart\nbob:hey\n\r\nexit\nignored\n")
            .await
            .unwrap();

        let mut lines = LineReader::new(client);
        let mut out = Vec::new();
        display_server(&mut lines, &mut out).await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "msg sent\nChatroom> bob:hey\nChatroom> "
        );
    }

    #[tokio::test]
    async fn test_display_ends_at_eof() {
        let (mut server, client) = tokio::io::duplex(64);
        server.write_all(b"alice\n\r\n").await.unwrap();
        drop(server);

        let mut lines = LineReader::new(client);
        let mut out = Vec::new();
        display_server(&mut lines, &mut out).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "alice\nChatroom> ");
    }

    #[tokio::test]
    async fn test_forward_skips_overlong_input() {
        let (mut keyboard, stdin) = tokio::io::duplex(4096);
        let (to_server, mut server) = tokio::io::duplex(4096);

        keyboard.write_all(b"msg \"hi\"\n").await.unwrap();
        keyboard
            .write_all(&vec![b'x'; MAX_LINE_LENGTH + 1])
            .await
            .unwrap();
        keyboard.write_all(b"\nonline\n").await.unwrap();
        drop(keyboard);

        let mut input = LineReader::unbounded(stdin);
        let mut out = LineWriter::new(to_server);
        forward_input(&mut input, &mut out).await.unwrap();
        drop(out);

        let mut sent = String::new();
        server.read_to_string(&mut sent).await.unwrap();
        assert_eq!(sent, "msg \"hi\"\nonline\n");
    }
}
