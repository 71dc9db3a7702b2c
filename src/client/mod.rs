//! Load-generating benchmark client.
//!
//! [`Benchmark::run`] spawns one thread per configured worker. Each worker
//! issues its requests one after another, records connect latency and
//! throughput into the shared [`Aggregator`], and stores the response body as
//! a download artifact. Once every worker has been joined the samples are
//! reduced to their means.

pub mod exchange;
pub mod worker;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use tracing::info;

use crate::config::ClientConfig;
use crate::stats::{Aggregator, Category};

pub use worker::{Worker, WorkerSummary};

/// Averages and tallies of one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Mean connect latency in microseconds
    pub connect_micros: Option<u64>,
    /// Mean throughput in bytes per second
    pub throughput: Option<u64>,
    pub connects: usize,
    pub throughput_samples: usize,
    pub summary: WorkerSummary,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>10}\t{:>19}",
            self.connect_micros.unwrap_or(0),
            self.throughput.unwrap_or(0)
        )
    }
}

pub struct Benchmark {
    cfg: Arc<ClientConfig>,
    stats: Arc<Aggregator>,
}

impl Benchmark {
    pub fn new(cfg: ClientConfig) -> Self {
        Self::with_aggregator(cfg, Arc::new(Aggregator::new()))
    }

    pub fn with_aggregator(cfg: ClientConfig, stats: Arc<Aggregator>) -> Self {
        Self {
            cfg: Arc::new(cfg),
            stats,
        }
    }

    pub fn run(&self) -> anyhow::Result<Report> {
        fs::create_dir_all(&self.cfg.download_dir).with_context(|| {
            format!("failed to create {}", self.cfg.download_dir.display())
        })?;
        let artifact = artifact_path(&self.cfg.download_dir, &self.cfg.uri);

        let handles = (0..self.cfg.workers)
            .map(|id| {
                let worker = Worker::new(
                    id,
                    Arc::clone(&self.cfg),
                    Arc::clone(&self.stats),
                    artifact.clone(),
                );
                thread::Builder::new()
                    .name(format!("bench-{id}"))
                    .spawn(move || worker.run())
            })
            .collect::<Result<Vec<_>, _>>()
            .context("failed to spawn benchmark worker")?;

        // Join barrier: no worker touches the aggregator past this point.
        let mut summary = WorkerSummary::default();
        for handle in handles {
            let worker_summary = handle
                .join()
                .map_err(|_| anyhow::anyhow!("benchmark worker panicked"))?;
            summary.merge(worker_summary);
        }

        let connects = self.stats.count(Category::Connect);
        let throughput_samples = self.stats.count(Category::Throughput);
        let report = Report {
            connect_micros: self.stats.reduce_and_reset(Category::Connect),
            throughput: self.stats.reduce_and_reset(Category::Throughput),
            connects,
            throughput_samples,
            summary,
        };

        info!(
            completed = summary.completed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            connects,
            "benchmark finished"
        );

        Ok(report)
    }
}

/// Where the body fetched for `uri` is stored: the URI without its leading
/// slash, with path separators replaced by underscores.
///
/// ```
/// # use std::path::{Path, PathBuf};
/// # use loadline::client::artifact_path;
/// assert_eq!(
///     artifact_path(Path::new("Downloads"), "/docs/a.html"),
///     PathBuf::from("Downloads/docs_a.html")
/// );
/// ```
pub fn artifact_path(dir: &Path, uri: &str) -> PathBuf {
    let name = uri.trim_start_matches('/').replace('/', "_");
    if name.is_empty() {
        dir.join("index.html")
    } else {
        dir.join(name)
    }
}
