use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use crate::http::response::ResponseHead;
use crate::http::version::HttpVersion;

const BODY_CHUNK: usize = 8192;

/// Serializes the GET issued by the benchmark client. HTTP/1.1 requests carry
/// the mandatory `Host` header.
pub fn serialize_request(uri: &str, version: HttpVersion, host: &str) -> Vec<u8> {
    let mut buf = format!("GET {uri} {version}\r\n");

    if version == HttpVersion::Http11 {
        buf.push_str("Host: ");
        buf.push_str(host);
        buf.push_str("\r\n");
    }

    buf.push_str("\r\n");
    buf.into_bytes()
}

/// Writes a response head followed by exactly `content_length` bytes taken
/// from the body source.
#[derive(Debug)]
pub struct ResponseWriter<R> {
    head: ResponseHead,
    body: Option<R>,
}

impl<R: Read> ResponseWriter<R> {
    pub fn new(head: ResponseHead, body: Option<R>) -> Self {
        Self { head, body }
    }

    /// A response without a body.
    pub fn empty(head: ResponseHead) -> Self {
        Self { head, body: None }
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    /// Streams the response and returns the service time, measured from the
    /// first header byte to the last body byte.
    ///
    /// A body source that runs dry before the declared length is an error: the
    /// peer could no longer find the end of the message.
    pub fn write_to<W: Write>(self, stream: &mut W) -> io::Result<Duration> {
        let started = Instant::now();
        stream.write_all(&self.head.to_bytes())?;

        if let Some(body) = self.body {
            let expected = self.head.content_length;
            let sent = copy_chunked(&mut body.take(expected), stream)?;
            if sent < expected {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("resource ended after {sent} of {expected} bytes"),
                ));
            }
        }

        stream.flush()?;
        Ok(started.elapsed())
    }
}

fn copy_chunked<R: Read, W: Write>(body: &mut R, stream: &mut W) -> io::Result<u64> {
    let mut chunk = [0u8; BODY_CHUNK];
    let mut sent = 0u64;

    loop {
        let n = match body.read(&mut chunk) {
            Ok(0) => return Ok(sent),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        stream.write_all(&chunk[..n])?;
        sent += n as u64;
    }
}
