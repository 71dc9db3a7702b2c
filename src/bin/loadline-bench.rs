use std::path::PathBuf;

use clap::Parser;

use loadline::client::Benchmark;
use loadline::config::{ClientConfig, DEFAULT_DOWNLOAD_DIR};
use loadline::http::version::HttpVersion;
use loadline::logging;

/// Issues concurrent GET requests and reports average connect latency (us)
/// and throughput (bytes/s)
#[derive(Parser, Debug)]
#[command(name = "loadline-bench", version)]
struct Args {
    /// Protocol version: 1.0 or 1.1
    http_mode: HttpVersion,

    /// Server hostname
    hostname: String,

    /// Server port
    port: u16,

    /// Request target, e.g. /index.html
    uri: String,

    /// Requests issued by each worker
    requests: usize,

    /// Concurrent workers
    #[arg(default_value_t = 1)]
    workers: usize,

    /// Directory response bodies are written to
    #[arg(long, default_value = DEFAULT_DOWNLOAD_DIR)]
    download_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let args = Args::parse();
    let cfg = ClientConfig {
        http_mode: args.http_mode,
        host: args.hostname,
        port: args.port,
        uri: args.uri,
        requests: args.requests,
        workers: args.workers,
        download_dir: args.download_dir,
    };
    cfg.validate()?;

    let report = Benchmark::new(cfg).run()?;
    println!("{report}");

    Ok(())
}
