use std::fs::File;
use std::io::{self, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::http::error::ConnectionError;
use crate::http::framer::{Frame, Framer};
use crate::http::persistence::Persistence;
use crate::http::request::{Method, Request};
use crate::http::resource::{self, Resource};
use crate::http::response::{ResponseHead, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::http::version::HttpVersion;

/// What every connection needs to know about the server it belongs to.
#[derive(Debug, Clone)]
pub struct ServeContext {
    pub root: PathBuf,
    pub version: HttpVersion,
    pub idle_timeout: Duration,
}

impl From<&ServerConfig> for ServeContext {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            root: cfg.root.clone(),
            version: cfg.http_mode,
            idle_timeout: cfg.idle_timeout(),
        }
    }
}

pub struct Connection {
    stream: TcpStream,
    framer: Framer,
    ctx: Arc<ServeContext>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request, Persistence),
    Writing(Request, ResponseWriter<File>, Persistence),
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, ctx: Arc<ServeContext>) -> Self {
        // Idle persistent connections must not hold a worker forever.
        if ctx.version == HttpVersion::Http11 {
            if let Err(e) = stream.set_read_timeout(Some(ctx.idle_timeout)) {
                warn!(error = %e, "failed to set read timeout");
            }
        }

        Self {
            stream,
            framer: Framer::new(),
            ctx,
            state: ConnectionState::Reading,
        }
    }

    /// Runs the read/respond cycle until the persistence policy, the peer or
    /// the idle timeout ends it.
    pub fn run(&mut self) -> Result<(), ConnectionError> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Reading => match self.read_request() {
                    Ok(next) => next,
                    Err(ConnectionError::IdleTimeout) => {
                        debug!("idle connection timed out");
                        ConnectionState::Closed
                    }
                    Err(e) => return Err(e),
                },

                ConnectionState::Processing(request, forced) => {
                    let persistence =
                        forced.and(Persistence::for_server(self.ctx.version, &request));
                    let writer = handle_request(&request, &self.ctx, persistence)?;
                    ConnectionState::Writing(request, writer, persistence)
                }

                ConnectionState::Writing(mut request, writer, persistence) => {
                    let status = writer.head().status;
                    let elapsed = writer.write_to(&mut self.stream)?;
                    request.elapsed = Some(elapsed);
                    report(&request, status);

                    if persistence.is_keep_alive() {
                        ConnectionState::Reading
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    fn read_request(&mut self) -> Result<ConnectionState, ConnectionError> {
        match self.framer.read_request(&mut self.stream) {
            Ok(Frame::Complete { body_offset, len }) => {
                let request = Request::parse(&self.framer.buffer()[..body_offset]);
                self.framer.consume(len);
                Ok(ConnectionState::Processing(request, Persistence::KeepAlive))
            }

            Ok(Frame::Closed { buffered: 0, .. }) => Ok(ConnectionState::Closed),

            // The peer stopped sending mid-message: answer what arrived, then close.
            Ok(Frame::Closed { .. }) => {
                let request = Request::parse(self.framer.buffer());
                debug!(uri = %request.uri, "peer closed before the end of the request");
                Ok(ConnectionState::Processing(request, Persistence::Close))
            }

            Err(ConnectionError::Protocol(e)) => {
                let head = self.framer.head().unwrap_or_default();
                let mut request = Request::parse(head);
                request.valid = false;
                debug!(error = %e, "rejecting request");
                Ok(ConnectionState::Processing(request, Persistence::Close))
            }

            Err(e) => Err(e),
        }
    }
}

/// Builds the response for `request`.
///
/// Invalid requests get 400, recognised methods other than GET get 501. A GET
/// is answered from the document root with 200, 403 or 404. Filesystem
/// failures other than those are returned as errors.
pub fn handle_request(
    request: &Request,
    ctx: &ServeContext,
    persistence: Persistence,
) -> Result<ResponseWriter<File>, ConnectionError> {
    let head = |status| {
        ResponseHead::new(ctx.version, status).close(persistence.announce_close(ctx.version))
    };

    if !request.valid {
        return Ok(ResponseWriter::empty(head(StatusCode::BadRequest)));
    }

    if request.method != Some(Method::GET) {
        return Ok(ResponseWriter::empty(head(StatusCode::NotImplemented)));
    }

    let writer = match open_resource(&ctx.root, &request.uri)? {
        Resource::File { file, len } => {
            ResponseWriter::new(head(StatusCode::Ok).content_length(len), Some(file))
        }
        Resource::Missing => ResponseWriter::empty(head(StatusCode::NotFound)),
        Resource::Forbidden => ResponseWriter::empty(head(StatusCode::Forbidden)),
    };

    Ok(writer)
}

fn open_resource(root: &Path, uri: &str) -> Result<Resource, ConnectionError> {
    resource::open(root, uri).map_err(ConnectionError::Io)
}

fn report(request: &Request, status: StatusCode) {
    let elapsed = request.elapsed.unwrap_or_default();

    debug!(
        method = request.method.map_or("-", |m| m.as_str()),
        uri = %request.uri,
        status = status.as_u16(),
        elapsed_us = elapsed.as_micros() as u64,
        "request served"
    );

    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", elapsed.as_micros()).and_then(|()| stdout.flush()) {
        debug!(error = %e, "failed to report service time");
    }
}
