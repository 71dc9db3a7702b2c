//! Incremental message framing over a byte stream.
//!
//! A [`Framer`] owns everything read so far on one connection. It finds the
//! end of the message head (`\r\n\r\n`) without rescanning bytes it has
//! already looked at, and uses `Content-Length` to decide when the body is
//! complete. Bytes beyond the current message stay buffered for the next one.

use std::io::{self, Read};

use bytes::{Buf, BytesMut};

use crate::http::error::{ConnectionError, ProtocolError};

/// Separates the message head from the body.
pub const HEADER_BOUNDARY: &[u8] = b"\r\n\r\n";

// Anchored on the preceding line break so `X-Content-Length` never matches.
const CONTENT_LENGTH: &[u8] = b"\r\nContent-Length: ";

const READ_CHUNK: usize = 4096;

/// Largest message head accepted before the boundary shows up.
pub const MAX_HEAD: usize = 8192;

/// Largest request body a client may declare.
pub const MAX_REQUEST_BODY: usize = 1 << 20;

/// Looks for `needle` in the part of `buf` a read of `newly_read` bytes could
/// have completed: the new bytes plus `needle.len() - 1` bytes before them.
///
/// Returns the offset just past the first match.
pub fn search(buf: &[u8], newly_read: usize, needle: &[u8]) -> Option<usize> {
    debug_assert!(!needle.is_empty());

    let window = newly_read + needle.len() - 1;
    let from = buf.len().saturating_sub(window);

    buf[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| from + pos + needle.len())
}

/// Outcome of reading one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// The first `len` buffered bytes form a complete message whose body
    /// starts at `body_offset`.
    Complete { body_offset: usize, len: usize },
    /// The peer closed the stream before the message was complete.
    Closed {
        body_offset: Option<usize>,
        buffered: usize,
    },
}

#[derive(Debug)]
pub struct Framer {
    buf: BytesMut,
    body_offset: Option<usize>,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(READ_CHUNK),
            body_offset: None,
        }
    }

    /// Appends a freshly read chunk and returns the body offset once the end
    /// of the head has been seen.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<usize> {
        self.buf.extend_from_slice(chunk);

        if self.body_offset.is_none() {
            self.body_offset = search(&self.buf, chunk.len(), HEADER_BOUNDARY);
        }

        self.body_offset
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    pub fn body_offset(&self) -> Option<usize> {
        self.body_offset
    }

    /// The message head including its terminating blank line.
    pub fn head(&self) -> Option<&[u8]> {
        self.body_offset.map(|offset| &self.buf[..offset])
    }

    /// Everything buffered after the head.
    pub fn body(&self) -> &[u8] {
        match self.body_offset {
            Some(offset) => &self.buf[offset..],
            None => &[],
        }
    }

    /// The declared `Content-Length`, once the head is complete.
    ///
    /// The header name is matched case-sensitively.
    pub fn content_length(&self) -> Result<Option<usize>, ProtocolError> {
        let Some(head) = self.head() else {
            return Ok(None);
        };

        let Some(start) = search(head, head.len(), CONTENT_LENGTH) else {
            return Ok(None);
        };

        let end = head[start..]
            .windows(2)
            .position(|w| w == b"\r\n")
            .map_or(head.len(), |pos| start + pos);

        let value = String::from_utf8_lossy(&head[start..end]);
        value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ProtocolError::InvalidContentLength {
                value: value.into_owned(),
            })
    }

    /// Whether `declared` body bytes have arrived after the head.
    pub fn body_complete(&self, declared: usize) -> bool {
        self.body_offset.is_some() && self.body().len() >= declared
    }

    /// How much the next read may ask for: `max` while the head is
    /// incomplete, then only the body bytes still missing.
    pub fn read_limit(&self, max: usize, declared: usize) -> usize {
        match self.body_offset {
            Some(_) => max.min(declared.saturating_sub(self.body().len())),
            None => max,
        }
    }

    /// Drops the first `len` bytes and rearms the head search on whatever
    /// follows them.
    pub fn consume(&mut self, len: usize) {
        let len = len.min(self.buf.len());
        self.buf.advance(len);
        self.body_offset = search(&self.buf, self.buf.len(), HEADER_BOUNDARY);
    }

    /// Performs one read of at most `limit` bytes. Returns the number of bytes
    /// read; zero means the peer closed the stream.
    pub fn fill_from<R: Read>(&mut self, reader: &mut R, limit: usize) -> io::Result<usize> {
        let mut chunk = [0u8; READ_CHUNK];
        let limit = limit.clamp(1, READ_CHUNK);

        loop {
            match reader.read(&mut chunk[..limit]) {
                Ok(n) => {
                    self.feed(&chunk[..n]);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Reads a request. A request without `Content-Length` is complete at the
    /// end of its head. Heads longer than [`MAX_HEAD`] and bodies longer than
    /// [`MAX_REQUEST_BODY`] are rejected.
    pub fn read_request<R: Read>(&mut self, reader: &mut R) -> Result<Frame, ConnectionError> {
        loop {
            self.check_head()?;
            let declared = self.content_length()?.unwrap_or(0);
            if declared > MAX_REQUEST_BODY {
                return Err(ProtocolError::BodyTooLarge {
                    declared,
                    limit: MAX_REQUEST_BODY,
                }
                .into());
            }

            if let Some(body_offset) = self.body_offset {
                if self.body_complete(declared) {
                    return Ok(Frame::Complete {
                        body_offset,
                        len: body_offset + declared,
                    });
                }
            }

            if self.fill_from(reader, self.read_limit(READ_CHUNK, declared))? == 0 {
                return Ok(Frame::Closed {
                    body_offset: self.body_offset,
                    buffered: self.buf.len(),
                });
            }
        }
    }

    /// Reads a response. The head must declare `Content-Length`; once it is
    /// known, reads never ask for more than the bytes still missing.
    pub fn read_response<R: Read>(&mut self, reader: &mut R) -> Result<Frame, ConnectionError> {
        loop {
            self.check_head()?;
            let declared = match self.body_offset {
                Some(body_offset) => {
                    let declared = self
                        .content_length()?
                        .ok_or(ProtocolError::MissingContentLength)?;
                    if self.body_complete(declared) {
                        return Ok(Frame::Complete {
                            body_offset,
                            len: body_offset + declared,
                        });
                    }
                    declared
                }
                None => 0,
            };

            if self.fill_from(reader, self.read_limit(READ_CHUNK, declared))? == 0 {
                return match self.body_offset {
                    Some(_) => Ok(Frame::Closed {
                        body_offset: self.body_offset,
                        buffered: self.buf.len(),
                    }),
                    None => Err(ProtocolError::ShortMessage {
                        received: self.buf.len(),
                    }
                    .into()),
                };
            }
        }
    }

    fn check_head(&self) -> Result<(), ProtocolError> {
        if self.body_offset.is_none() && self.buf.len() > MAX_HEAD {
            return Err(ProtocolError::HeadTooLarge { limit: MAX_HEAD });
        }
        Ok(())
    }
}
