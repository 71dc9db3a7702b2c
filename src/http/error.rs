use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Structural problems with a message read off the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("connection closed after {received} bytes, before the end of the message head")]
    ShortMessage { received: usize },

    #[error("Missing Content-Length")]
    MissingContentLength,

    #[error("invalid Content-Length: {value}")]
    InvalidContentLength { value: String },

    #[error("message head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },

    #[error("declared body of {declared} bytes exceeds {limit}")]
    BodyTooLarge { declared: usize, limit: usize },
}

/// Everything that can end a connection or a single exchange on it.
///
/// `Disconnected` and `IdleTimeout` are routine: the peer went away or stopped
/// talking. Everything else is unexpected and only ends the affected
/// connection, never the dispatcher.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("peer disconnected: {0}")]
    Disconnected(#[source] io::Error),

    #[error("idle read timed out")]
    IdleTimeout,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Artifact { path: PathBuf, source: io::Error },

    #[error("i/o error: {0}")]
    Io(#[source] io::Error),
}

impl ConnectionError {
    /// Whether the failure is a normal way for a connection to end.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConnectionError::Disconnected(_) | ConnectionError::IdleTimeout)
    }
}

impl From<io::Error> for ConnectionError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => ConnectionError::Disconnected(err),
            // SO_RCVTIMEO surfaces as EAGAIN on Linux
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ConnectionError::IdleTimeout,
            _ => ConnectionError::Io(err),
        }
    }
}
