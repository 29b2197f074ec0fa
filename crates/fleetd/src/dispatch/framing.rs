//! Newline framing over a blocking stream with a read timeout.
//!
//! Each socket read takes at most `limit` bytes. A line that reaches `limit`
//! bytes without a newline is handed out truncated and the rest of it, up to
//! and including the next newline, is discarded.

use std::io::{self, Read};

/// Result of waiting for the next line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReadOutcome {
    /// A complete line without its terminator.
    Line(Vec<u8>),
    /// The peer closed the connection.
    Closed,
    /// The read timeout elapsed with no complete line.
    TimedOut,
}

/// Buffers bytes between reads and splits them into lines.
#[derive(Debug)]
pub(crate) struct LineReader {
    buffer: Vec<u8>,
    chunk: Vec<u8>,
    limit: usize,
    discarding: bool,
}

impl LineReader {
    pub(crate) fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            buffer: Vec::new(),
            chunk: vec![0; limit],
            limit,
            discarding: false,
        }
    }

    /// Returns the next buffered line, reading from `stream` when needed.
    ///
    /// Lines already buffered from an earlier read are returned before the
    /// stream is touched again. A trailing fragment left when the peer closes
    /// is returned as a final line.
    pub(crate) fn next_line<R: Read>(&mut self, stream: &mut R) -> io::Result<ReadOutcome> {
        loop {
            if let Some(line) = self.take_buffered_line() {
                return Ok(ReadOutcome::Line(line));
            }

            let read = match stream.read(&mut self.chunk) {
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Ok(ReadOutcome::TimedOut);
                }
                Err(error) => return Err(error),
            };

            if read == 0 {
                if self.buffer.is_empty() || self.discarding {
                    self.buffer.clear();
                    return Ok(ReadOutcome::Closed);
                }
                return Ok(ReadOutcome::Line(std::mem::take(&mut self.buffer)));
            }
            self.buffer.extend_from_slice(&self.chunk[..read]);
        }
    }

    fn take_buffered_line(&mut self) -> Option<Vec<u8>> {
        loop {
            let newline = self.buffer.iter().position(|byte| *byte == b'\n');
            if self.discarding {
                let Some(end) = newline else {
                    self.buffer.clear();
                    return None;
                };
                self.buffer.drain(..=end);
                self.discarding = false;
                continue;
            }
            return match newline {
                Some(end) if end <= self.limit => {
                    let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
                    line.pop();
                    Some(line)
                }
                _ if self.buffer.len() >= self.limit => {
                    self.discarding = true;
                    Some(self.buffer.drain(..self.limit).collect())
                }
                _ => None,
            };
        }
    }
}
