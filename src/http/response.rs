use crate::http::version::HttpVersion;

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): the resource follows
/// - `BadRequest` (400): malformed request line
/// - `Forbidden` (403): unreadable file or a directory
/// - `NotFound` (404): no such file
/// - `NotImplemented` (501): recognised method other than GET
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use loadline::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// Status line and headers of a response. The body is streamed separately
/// by [`ResponseWriter`](crate::http::writer::ResponseWriter).
///
/// Every response declares its length, including error responses, which
/// carry `Content-Length: 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub version: HttpVersion,
    pub status: StatusCode,
    pub content_length: u64,
    /// Emit `Connection: close`
    pub close: bool,
}

impl ResponseHead {
    pub fn new(version: HttpVersion, status: StatusCode) -> Self {
        Self {
            version,
            status,
            content_length: 0,
            close: false,
        }
    }

    pub fn content_length(mut self, len: u64) -> Self {
        self.content_length = len;
        self
    }

    pub fn close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = format!(
            "{} {} {}\r\nContent-Length: {}\r\n",
            self.version,
            self.status.as_u16(),
            self.status.reason_phrase(),
            self.content_length
        );

        if self.close {
            buf.push_str("Connection: close\r\n");
        }

        buf.push_str("\r\n");
        buf.into_bytes()
    }
}

/// Extracts the numeric status from a response head.
///
/// ```
/// # use loadline::http::response::parse_status_code;
/// assert_eq!(parse_status_code(b"HTTP/1.1 404 Not Found\r\n\r\n"), Some(404));
/// assert_eq!(parse_status_code(b"garbage\r\n\r\n"), None);
/// ```
pub fn parse_status_code(head: &[u8]) -> Option<u16> {
    let text = String::from_utf8_lossy(head);
    let status_line = text.split("\r\n").next()?;
    status_line.split_whitespace().nth(1)?.parse().ok()
}
