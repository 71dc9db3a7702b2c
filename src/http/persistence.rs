use crate::http::framer::search;
use crate::http::request::Request;
use crate::http::version::HttpVersion;

const CONNECTION_CLOSE: &[u8] = b"Connection: close\r\n";

/// Whether a connection survives the exchange that just happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    KeepAlive,
    Close,
}

impl Persistence {
    /// Server side: decided after answering `request` with a response of
    /// version `server`.
    ///
    /// An HTTP/1.0 server closes after every response. An HTTP/1.1 server
    /// closes when the client declared HTTP/1.0 or asked for
    /// `Connection: close`, and keeps the connection otherwise.
    pub fn for_server(server: HttpVersion, request: &Request) -> Self {
        match server {
            HttpVersion::Http10 => Persistence::Close,
            HttpVersion::Http11
                if request.declared_version() == Some(HttpVersion::Http10)
                    || request.close_requested =>
            {
                Persistence::Close
            }
            HttpVersion::Http11 => Persistence::KeepAlive,
        }
    }

    /// Whether the response has to carry `Connection: close`. HTTP/1.0 peers
    /// expect the close and are not told.
    pub fn announce_close(self, server: HttpVersion) -> bool {
        self == Persistence::Close && server == HttpVersion::Http11
    }

    /// Client side: decided from the response head received in `mode`.
    ///
    /// Closes in HTTP/1.0 mode, when the head carries `Connection: close`, or
    /// when the server itself answered as HTTP/1.0.
    pub fn for_client(mode: HttpVersion, head: &[u8]) -> Self {
        if mode == HttpVersion::Http10
            || head.starts_with(b"HTTP/1.0 ")
            || search(head, head.len(), CONNECTION_CLOSE).is_some()
        {
            Persistence::Close
        } else {
            Persistence::KeepAlive
        }
    }

    /// Combines two decisions; closing wins.
    pub fn and(self, other: Persistence) -> Self {
        if self == Persistence::Close || other == Persistence::Close {
            Persistence::Close
        } else {
            Persistence::KeepAlive
        }
    }

    pub fn is_keep_alive(self) -> bool {
        self == Persistence::KeepAlive
    }
}
