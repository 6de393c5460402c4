// SPDX-License-Identifier: Apache-2.0

//! Newline framing for the pipe stream.
//!
//! Lines are opaque bytes: no UTF-8 validation happens here. A trailing
//! `\r` is dropped, and a final fragment without a newline is still
//! returned at end of input.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::warn;

const READ_BUF_SIZE: usize = 8192;

pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: BytesMut,
    max_line_length: usize,
    // Set while skipping the rest of an oversized line
    discarding: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R, max_line_length: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUF_SIZE, inner),
            buf: BytesMut::with_capacity(READ_BUF_SIZE),
            max_line_length,
            discarding: false,
        }
    }

    /// Returns the next line without its terminator, or `None` at end of input.
    ///
    /// Lines longer than the maximum are skipped up to the next newline and
    /// logged; reading then continues with the following line.
    pub async fn next_line(&mut self) -> std::io::Result<Option<Bytes>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                let discarded = std::mem::take(&mut self.discarding);
                if discarded || self.buf.is_empty() {
                    self.buf.clear();
                    return Ok(None);
                }
                return Ok(Some(self.take_line()));
            }

            let (chunk_len, found_newline) = match available.iter().position(|b| *b == b'\n') {
                Some(pos) => (pos, true),
                None => (available.len(), false),
            };

            if !self.discarding {
                if self.buf.len() + chunk_len > self.max_line_length {
                    warn!(
                        max_line_length = self.max_line_length,
                        "Discarding input line exceeding maximum length"
                    );
                    self.buf.clear();
                    self.discarding = true;
                } else {
                    self.buf.extend_from_slice(&available[..chunk_len]);
                }
            }

            let consumed = if found_newline { chunk_len + 1 } else { chunk_len };
            self.reader.consume(consumed);

            if found_newline {
                if std::mem::take(&mut self.discarding) {
                    continue;
                }
                return Ok(Some(self.take_line()));
            }
        }
    }

    fn take_line(&mut self) -> Bytes {
        let mut line = self.buf.split();
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        line.freeze()
    }
}
