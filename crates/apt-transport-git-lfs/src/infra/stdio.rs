//! Line-oriented message transport over the parent's stdin/stdout.
//!
//! Messages are blocks of lines terminated by a blank line. The reader only
//! frames blocks; turning them into typed messages is left to
//! [`Message::parse`] so malformed input can still be reported.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::domain::message::Message;

/// Reads raw message blocks from the parent.
pub struct MessageReader<R> {
    reader: R,
    line: Vec<u8>,
}

impl<R> MessageReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Wraps a buffered input stream.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
        }
    }

    /// Reads the lines of the next message, status line first.
    ///
    /// Blank lines before a message are skipped. Returns `None` once the
    /// stream ends with no pending lines; a final message without its
    /// terminating blank line is still returned. Bytes that are not UTF-8
    /// are replaced with U+FFFD so the message can still be answered.
    ///
    /// # Errors
    /// Returns an error when reading from the stream fails.
    pub async fn read_message(&mut self) -> io::Result<Option<Vec<String>>> {
        let mut message_lines = Vec::new();
        while let Some(line) = self.next_line().await? {
            if !line.is_empty() {
                message_lines.push(line);
                continue;
            }
            if !message_lines.is_empty() {
                return Ok(Some(message_lines));
            }
        }

        Ok((!message_lines.is_empty()).then_some(message_lines))
    }

    /// Reads one line without its `\n` or `\r\n` terminator.
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line).await? == 0 {
            return Ok(None);
        }
        if self.line.ends_with(b"\n") {
            self.line.pop();
            if self.line.ends_with(b"\r") {
                self.line.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&self.line).into_owned()))
    }
}

/// Writes encoded messages to the parent, flushing after each one.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W> MessageWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wraps an output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Encodes and sends one message.
    ///
    /// # Errors
    /// Returns an error when the write or flush fails.
    pub async fn send(&mut self, message: &Message) -> io::Result<()> {
        self.writer.write_all(message.encode().as_bytes()).await?;
        self.writer.flush().await
    }

    /// Returns the wrapped output stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
