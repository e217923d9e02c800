//! Line transport
//!
//! Thin wrappers giving the rest of the crate the two operations it needs
//! from a byte stream: read one line, and write exact bytes.

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec};

use crate::error::AppError;

/// Longest accepted line, excluding the terminator
pub const MAX_LINE_LENGTH: usize = 1024;

/// Newline-delimited reader
///
/// The trailing `\n` (and a preceding `\r`) is stripped from each line.
pub struct LineReader<R> {
    inner: FramedRead<R, LinesCodec>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
        }
    }

    /// Reader without a length limit, for trusted local input
    pub fn unbounded(reader: R) -> Self {
        Self {
            inner: FramedRead::new(reader, LinesCodec::new()),
        }
    }

    /// Read the next line
    ///
    /// Returns `Ok(None)` once the peer has closed its side cleanly.
    pub async fn read_line(&mut self) -> Result<Option<String>, AppError> {
        Ok(self.inner.next().await.transpose()?)
    }
}

/// Exact-bytes writer
pub struct LineWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { inner: writer }
    }

    /// Write the whole buffer and flush it
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<(), AppError> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Close the write side of the stream
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn test_read_lines_until_eof() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = LineReader::new(server);

        client.write_all(b"alice\nonline\r\n").await.unwrap();
        drop(client);

        assert_eq!(reader.read_line().await.unwrap(), Some("alice".to_string()));
        assert_eq!(reader.read_line().await.unwrap(), Some("online".to_string()));
        assert_eq!(reader.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_line_too_long() {
        let (mut client, server) = tokio::io::duplex(4096);
        let mut reader = LineReader::new(server);

        let long = "x".repeat(MAX_LINE_LENGTH + 1);
        client.write_all(long.as_bytes()).await.unwrap();
        client.write_all(b"\n").await.unwrap();

        assert!(matches!(reader.read_line().await, Err(AppError::Line(_))));
    }

    #[tokio::test]
    async fn test_write_then_shutdown() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut writer = LineWriter::new(client);

        writer.write_all(b"msg sent\n\r\n").await.unwrap();
        writer.shutdown().await.unwrap();

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "msg sent\n\r\n");
    }
}
