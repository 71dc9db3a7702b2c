use std::time::Duration;

use crate::http::version::HttpVersion;

/// HTTP request methods.
///
/// Every method defined by HTTP/1.1 is recognised, but the server only
/// serves GET. Other recognised methods are answered with 501 Not Implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// TRACE - Loop the request back
    TRACE,
    /// CONNECT - Open a tunnel
    CONNECT,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Matching is case-sensitive, as on the wire.
    ///
    /// ```
    /// # use loadline::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "OPTIONS" => Some(Method::OPTIONS),
            "TRACE" => Some(Method::TRACE),
            "CONNECT" => Some(Method::CONNECT),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::CONNECT => "CONNECT",
        }
    }
}

/// One request read off a connection.
///
/// Malformed requests are still represented, with `valid` cleared, so that
/// the server can answer them with 400 Bad Request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The method, when it is one of the recognised ones
    pub method: Option<Method>,
    /// The request target as sent, origin-form or absolute-form
    pub uri: String,
    /// The version token declared by the client
    pub version: String,
    /// Whether the request line passed validation
    pub valid: bool,
    /// The head carried `Connection: close`
    pub close_requested: bool,
    /// Service time, once the response has been written
    pub elapsed: Option<Duration>,
}

impl Request {
    /// Parses a request head (request line plus optional header lines).
    ///
    /// The request line is split on whitespace into method, URI and version.
    /// Validation stops at the first failing rule:
    ///
    /// 1. the method is recognised,
    /// 2. the URI is not empty,
    /// 3. the URI starts with `/` or `*`, names an `http://` or `https://`
    ///    target, or the method is CONNECT,
    /// 4. the version is `HTTP/1.0` or `HTTP/1.1`.
    pub fn parse(head: &[u8]) -> Self {
        let text = String::from_utf8_lossy(head);
        // Tolerate stray blank lines before the request line.
        let mut lines = text.trim_start().split("\r\n");

        let mut parts = lines.next().unwrap_or_default().split_whitespace();
        let method_str = parts.next().unwrap_or_default();
        let uri = parts.next().unwrap_or_default().to_string();
        let version = parts.next().unwrap_or_default().to_string();

        let method = Method::from_str(method_str);
        let valid = validate(method, &uri, &version);

        let close_requested = lines.any(|line| {
            line.split_once(':').is_some_and(|(name, value)| {
                name.trim().eq_ignore_ascii_case("Connection")
                    && value.trim().eq_ignore_ascii_case("close")
            })
        });

        Self {
            method,
            uri,
            version,
            valid,
            close_requested,
            elapsed: None,
        }
    }

    /// A GET for `uri`, as issued by the benchmark client.
    pub fn get(uri: impl Into<String>, version: HttpVersion) -> Self {
        Self {
            method: Some(Method::GET),
            uri: uri.into(),
            version: version.as_str().to_string(),
            valid: true,
            close_requested: false,
            elapsed: None,
        }
    }

    /// The declared version, when it is one the server understands.
    pub fn declared_version(&self) -> Option<HttpVersion> {
        HttpVersion::from_token(&self.version)
    }
}

fn validate(method: Option<Method>, uri: &str, version: &str) -> bool {
    let Some(method) = method else {
        return false;
    };

    if uri.is_empty() {
        return false;
    }

    let target_ok = uri.starts_with('/')
        || uri.starts_with('*')
        || uri.contains("http://")
        || uri.contains("https://")
        || method == Method::CONNECT;
    if !target_ok {
        return false;
    }

    HttpVersion::from_token(version).is_some()
}
