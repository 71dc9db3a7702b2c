use std::fs;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::version::HttpVersion;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_DOWNLOAD_DIR: &str = "Downloads";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("port number must be between 1025 and 65535, got {0}")]
    PortOutOfRange(u16),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(u64),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("cannot resolve listen address {0}")]
    Address(String),
}

/// How accepted connections are mapped onto workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStrategy {
    /// One new thread per accepted connection
    #[default]
    Thread,
    /// A fixed pool of forked processes sharing the listening socket
    Process,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory files are served from
    pub root: PathBuf,
    /// Version the server answers with
    pub http_mode: HttpVersion,
    pub host: String,
    pub port: u16,
    /// Idle read timeout for HTTP/1.1 connections, in seconds
    pub timeout_secs: u64,
    pub dispatch: DispatchStrategy,
    /// Size of the process pool
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("www"),
            http_mode: HttpVersion::Http10,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            dispatch: DispatchStrategy::Thread,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl ServerConfig {
    /// Loads a YAML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port <= 1024 {
            return Err(ConfigError::PortOutOfRange(self.port));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(self.timeout_secs));
        }
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or(ConfigError::Address(addr))
    }
}

/// Settings of one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub http_mode: HttpVersion,
    pub host: String,
    pub port: u16,
    pub uri: String,
    /// Requests issued by each worker
    pub requests: usize,
    /// Concurrent workers
    #[serde(default = "default_client_workers")]
    pub workers: usize,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_client_workers() -> usize {
    1
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOAD_DIR)
}

impl ClientConfig {
    pub fn new(http_mode: HttpVersion, host: impl Into<String>, port: u16, uri: impl Into<String>) -> Self {
        Self {
            http_mode,
            host: host.into(),
            port,
            uri: uri.into(),
            requests: 1,
            workers: default_client_workers(),
            download_dir: default_download_dir(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests == 0 {
            return Err(ConfigError::Zero("requests"));
        }
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        Ok(())
    }
}

fn load_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
