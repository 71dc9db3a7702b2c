use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol versions spoken by the server and the benchmark client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpVersion {
    /// HTTP/1.0, one exchange per connection
    #[default]
    Http10,
    /// HTTP/1.1, persistent connections
    Http11,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid HTTP mode: {0}")]
pub struct InvalidVersion(pub String);

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
        }
    }

    /// Parses a version token exactly as it appears on the wire.
    ///
    /// ```
    /// # use loadline::http::version::HttpVersion;
    /// assert_eq!(HttpVersion::from_token("HTTP/1.1"), Some(HttpVersion::Http11));
    /// assert_eq!(HttpVersion::from_token("1.1"), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "HTTP/1.0" => Some(HttpVersion::Http10),
            "HTTP/1.1" => Some(HttpVersion::Http11),
            _ => None,
        }
    }
}

impl TryFrom<&str> for HttpVersion {
    type Error = InvalidVersion;

    /// Accepts the spellings used on command lines and in config files:
    /// `1`, `1.0`, `HTTP/1.0`, `1.1` and `HTTP/1.1`.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "1" | "1.0" | "HTTP/1.0" => Ok(HttpVersion::Http10),
            "1.1" | "HTTP/1.1" => Ok(HttpVersion::Http11),
            _ => Err(InvalidVersion(s.to_string())),
        }
    }
}

impl TryFrom<String> for HttpVersion {
    type Error = InvalidVersion;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        HttpVersion::try_from(s.as_str())
    }
}

impl FromStr for HttpVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpVersion::try_from(s)
    }
}

impl From<HttpVersion> for String {
    fn from(version: HttpVersion) -> Self {
        version.as_str().to_string()
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
