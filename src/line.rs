//! Line framing for the socket pumps.
//!
//! Inbound, [`LineCodec`] splits a byte buffer at `\n`, drops the CR in
//! front of it and decodes the line as UTF-8, falling back to a lossy
//! single-byte decoding so that a misencoded line is still delivered.
//! Outbound, it low-quotes a line and terminates it with CRLF.
//!
//! Lines longer than the codec's maximum are dropped, and so is the rest of
//! a partial line once it outgrows the maximum, up to its next `\n`.

use std::io;

use bytes::{Buf, BufMut, BytesMut};
use encoding::WINDOWS_1252;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::quote::low_quote;

/// Default maximum inbound line length in bytes, terminator included.
pub const DEFAULT_MAX_LINE_LEN: usize = 8192;

/// Newline-delimited text codec with a permissive decoder.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Skipping to the end of an overlong line
    discarding: bool,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len: max_len.max(1),
            discarding: false,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Decode one line's bytes: UTF-8 if valid, else ISO-8859-1 style.
    pub fn decode_text(bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_owned(),
            Err(_) => {
                let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
                text.into_owned()
            }
        }
    }

    /// Low-quote `text` and append CRLF unless it already ends with one.
    pub fn frame(text: &str) -> String {
        let mut line = low_quote(text);
        if !line.ends_with("\r\n") {
            line.push_str("\r\n");
        }
        line
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<String>> {
        loop {
            let newline = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| self.next_index + offset);

            match (self.discarding, newline) {
                (true, Some(end)) => {
                    src.advance(end + 1);
                    self.next_index = 0;
                    self.discarding = false;
                }
                (true, None) => {
                    src.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
                (false, Some(end)) => {
                    let line = src.split_to(end + 1);
                    self.next_index = 0;

                    if line.len() > self.max_len {
                        warn!(len = line.len(), limit = self.max_len, "dropping overlong line");
                        continue;
                    }

                    let body = &line[..line.len() - 1];
                    let body = body.strip_suffix(b"\r").unwrap_or(body);
                    return Ok(Some(Self::decode_text(body)));
                }
                (false, None) if src.len() > self.max_len => {
                    warn!(limit = self.max_len, "line too long, discarding up to next newline");
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    return Ok(None);
                }
                (false, None) => {
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }
}

impl Encoder<&str> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, text: &str, dst: &mut BytesMut) -> io::Result<()> {
        let line = Self::frame(text);
        dst.reserve(line.len());
        dst.put_slice(line.as_bytes());
        Ok(())
    }
}
