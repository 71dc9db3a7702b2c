use std::io;
use std::net::{SocketAddr, TcpListener};
use std::os::fd::AsRawFd;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::ServerConfig;
use crate::http::connection::ServeContext;
use crate::server::dispatch;

/// Binds `addr` and sizes the accept queue to `backlog`.
pub fn bind(addr: SocketAddr, backlog: i32) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr).with_context(|| format!("unable to bind {addr}"))?;

    // std listens with its own default queue length; calling listen(2) again
    // on a listening socket only updates it.
    // SAFETY: the descriptor is owned by `listener` and stays open for the call.
    let rc = unsafe { libc::listen(listener.as_raw_fd(), backlog) };
    if rc == -1 {
        return Err(io::Error::last_os_error()).context("failed to listen");
    }

    Ok(listener)
}

pub fn run(cfg: &ServerConfig) -> anyhow::Result<()> {
    let dispatcher = dispatch::for_config(cfg);
    let addr = cfg.socket_addr()?;
    let listener = bind(addr, dispatcher.backlog())?;

    info!(
        addr = %listener.local_addr()?,
        root = %cfg.root.display(),
        mode = %cfg.http_mode,
        dispatch = ?cfg.dispatch,
        "Listening"
    );

    dispatcher.serve(listener, Arc::new(ServeContext::from(cfg)))
}
