use std::path::PathBuf;

use clap::Parser;

use loadline::config::{DispatchStrategy, ServerConfig};
use loadline::http::version::HttpVersion;
use loadline::{logging, server};

/// Static file server speaking HTTP/1.0 and HTTP/1.1
#[derive(Parser, Debug)]
#[command(name = "loadline", version)]
struct Args {
    /// Protocol version to answer with: 1.0 or 1.1
    http_mode: Option<HttpVersion>,

    /// TCP port to listen on (1025-65535)
    port: Option<u16>,

    /// Idle read timeout for HTTP/1.1 connections, in seconds
    timeout: Option<u64>,

    /// Directory to serve files from
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// How connections are mapped onto workers
    #[arg(short, long, value_enum)]
    dispatch: Option<DispatchStrategy>,

    /// Number of worker processes for the process dispatcher
    #[arg(short, long)]
    workers: Option<usize>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// YAML file providing defaults for all of the above
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut cfg = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };

        if let Some(mode) = self.http_mode {
            cfg.http_mode = mode;
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(timeout) = self.timeout {
            cfg.timeout_secs = timeout;
        }
        if let Some(root) = self.root {
            cfg.root = root;
        }
        if let Some(dispatch) = self.dispatch {
            cfg.dispatch = dispatch;
        }
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        if let Some(host) = self.host {
            cfg.host = host;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let cfg = Args::parse().into_config()?;
    server::listener::run(&cfg)
}
