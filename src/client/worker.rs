use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::client::exchange::{self, Exchange};
use crate::config::ClientConfig;
use crate::http::error::ConnectionError;
use crate::http::framer::Framer;
use crate::stats::{self, Aggregator, Category};

/// Per-worker tallies, merged by the driver after the join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl WorkerSummary {
    pub fn merge(&mut self, other: WorkerSummary) {
        self.completed += other.completed;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// Issues the configured number of sequential requests, reusing the
/// connection for as long as the server keeps it open.
pub struct Worker {
    id: usize,
    cfg: Arc<ClientConfig>,
    stats: Arc<Aggregator>,
    artifact: PathBuf,
    conn: Option<(TcpStream, Framer)>,
}

impl Worker {
    pub fn new(id: usize, cfg: Arc<ClientConfig>, stats: Arc<Aggregator>, artifact: PathBuf) -> Self {
        Self {
            id,
            cfg,
            stats,
            artifact,
            conn: None,
        }
    }

    pub fn run(mut self) -> WorkerSummary {
        let mut summary = WorkerSummary::default();

        for iteration in 0..self.cfg.requests {
            match self.cycle() {
                Ok(exchange) => {
                    summary.completed += 1;
                    if exchange.status == Some(200) {
                        summary.succeeded += 1;
                    }
                }
                Err(e) => {
                    warn!(worker = self.id, iteration, error = %e, "request failed");
                    self.conn = None;
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    fn cycle(&mut self) -> Result<Exchange, ConnectionError> {
        let (mut stream, mut framer) = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let (stream, elapsed) = exchange::connect(&self.cfg.host, self.cfg.port)?;
                self.stats.record(Category::Connect, stats::micros(elapsed));
                (stream, Framer::new())
            }
        };

        let started = Instant::now();

        // The artifact is replaced only by a complete 200 body.
        let mut staged =
            NamedTempFile::new_in(&self.cfg.download_dir).map_err(|source| self.artifact_error(source))?;

        exchange::send_request(&mut stream, &self.cfg.uri, self.cfg.http_mode, &self.cfg.host)?;
        let exchange = exchange::receive(&mut stream, &mut framer, self.cfg.http_mode, &mut staged)?;

        let elapsed = started.elapsed();
        self.stats.record(
            Category::Throughput,
            stats::throughput(exchange.bytes_received, elapsed),
        );

        debug!(
            worker = self.id,
            status = exchange.status,
            bytes = exchange.bytes_received,
            keep_alive = exchange.persistence.is_keep_alive(),
            "exchange finished"
        );

        if exchange.persistence.is_keep_alive() {
            self.conn = Some((stream, framer));
        }

        if exchange.complete && exchange.status == Some(200) {
            staged
                .persist(&self.artifact)
                .map_err(|e| self.artifact_error(e.error))?;
        }

        Ok(exchange)
    }

    fn artifact_error(&self, source: std::io::Error) -> ConnectionError {
        ConnectionError::Artifact {
            path: self.artifact.clone(),
            source,
        }
    }
}
