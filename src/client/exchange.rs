//! One request/response exchange on a client connection.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::http::error::ConnectionError;
use crate::http::framer::{Frame, Framer};
use crate::http::persistence::Persistence;
use crate::http::response::parse_status_code;
use crate::http::version::HttpVersion;
use crate::http::writer::serialize_request;

/// What one exchange produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    pub status: Option<u16>,
    /// Head and body bytes of the response
    pub bytes_received: u64,
    pub body_len: usize,
    /// The whole declared body arrived
    pub complete: bool,
    /// Whether the connection may carry the next request
    pub persistence: Persistence,
}

/// Opens a connection to `host:port`, trying each resolved address in turn.
/// Returns the stream and the time the successful `connect` took; name
/// resolution is not charged.
pub fn connect(host: &str, port: u16) -> Result<(TcpStream, Duration), ConnectionError> {
    let addr = format!("{host}:{port}");
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ConnectionError::Connect {
            addr: addr.clone(),
            source,
        })?;

    let mut last_error = None;
    for candidate in addrs {
        let started = Instant::now();
        match TcpStream::connect(candidate) {
            Ok(stream) => return Ok((stream, started.elapsed())),
            Err(e) => {
                debug!(addr = %candidate, error = %e, "connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(ConnectionError::Connect {
        addr,
        source: last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address resolved")),
    })
}

pub fn send_request<W: Write>(
    stream: &mut W,
    uri: &str,
    mode: HttpVersion,
    host: &str,
) -> Result<usize, ConnectionError> {
    let request = serialize_request(uri, mode, host);
    stream.write_all(&request)?;
    stream.flush()?;
    Ok(request.len())
}

/// Reads one response through `framer` and copies its body into `sink`.
///
/// A response without `Content-Length` aborts the exchange. When the peer
/// closes during the body, whatever arrived is kept and the connection is
/// marked for closing.
pub fn receive<R: Read, W: Write>(
    stream: &mut R,
    framer: &mut Framer,
    mode: HttpVersion,
    sink: &mut W,
) -> Result<Exchange, ConnectionError> {
    let (body_offset, len, peer_closed) = match framer.read_response(stream)? {
        Frame::Complete { body_offset, len } => (body_offset, len, false),
        Frame::Closed {
            body_offset,
            buffered,
        } => (body_offset.unwrap_or(buffered), buffered, true),
    };

    let buf = framer.buffer();
    let head = &buf[..body_offset];
    let body = &buf[body_offset..len];
    sink.write_all(body).map_err(ConnectionError::Io)?;

    let mut persistence = Persistence::for_client(mode, head);
    if peer_closed {
        debug!(received = body.len(), "peer closed before the end of the body");
        persistence = Persistence::Close;
    }

    let exchange = Exchange {
        status: parse_status_code(head),
        bytes_received: len as u64,
        body_len: body.len(),
        complete: !peer_closed,
        persistence,
    };

    framer.consume(len);
    Ok(exchange)
}
