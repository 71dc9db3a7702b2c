//! Mapping accepted connections onto OS-level workers.
//!
//! Both strategies share one life cycle per connection:
//!
//! ```text
//! LISTENING --accept--> DISPATCHED --serve loop--> CLOSED
//! ```
//!
//! [`ThreadPerConnection`] spawns a thread for every accepted connection, so the
//! accept loop never waits on service time. [`ProcessPool`] forks a fixed
//! number of workers up front; each runs its own accept loop on the shared
//! listening socket and the kernel picks which one gets a new connection.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::config::{DispatchStrategy, ServerConfig};
use crate::http::connection::{Connection, ServeContext};

pub const THREAD_BACKLOG: i32 = 1000;
pub const PROCESS_BACKLOG: i32 = 100;

pub trait Dispatcher: Send + Sync {
    /// Serves connections from `listener` until a fatal error.
    fn serve(&self, listener: TcpListener, ctx: Arc<ServeContext>) -> anyhow::Result<()>;

    /// Accept queue length suited to this strategy.
    fn backlog(&self) -> i32;
}

pub fn for_config(cfg: &ServerConfig) -> Box<dyn Dispatcher> {
    match cfg.dispatch {
        DispatchStrategy::Thread => Box::new(ThreadPerConnection),
        DispatchStrategy::Process => Box::new(ProcessPool::new(cfg.workers)),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPerConnection;

impl Dispatcher for ThreadPerConnection {
    fn serve(&self, listener: TcpListener, ctx: Arc<ServeContext>) -> anyhow::Result<()> {
        loop {
            let Some((stream, peer)) = accept(&listener) else {
                continue;
            };

            let ctx = Arc::clone(&ctx);
            thread::Builder::new()
                .name(format!("conn-{peer}"))
                .spawn(move || serve_connection(stream, peer, &ctx))
                .context("failed to spawn connection thread")?;
        }
    }

    fn backlog(&self) -> i32 {
        THREAD_BACKLOG
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessPool {
    workers: usize,
}

impl ProcessPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Dispatcher for ProcessPool {
    /// Forks the workers and waits for them. Must be called before the process
    /// starts any other thread.
    fn serve(&self, listener: TcpListener, ctx: Arc<ServeContext>) -> anyhow::Result<()> {
        let mut children = Vec::with_capacity(self.workers);

        for worker in 0..self.workers {
            // SAFETY: the process is still single-threaded, so the child gets a
            // consistent copy of the address space.
            match unsafe { libc::fork() } {
                -1 => return Err(io::Error::last_os_error()).context("fork"),
                0 => accept_loop(&listener, &ctx),
                pid => {
                    info!(worker, pid, "Started worker process");
                    children.push(pid);
                }
            }
        }

        for pid in children {
            let status = wait_for(pid).with_context(|| format!("waitpid {pid}"))?;
            warn!(pid, status, "Worker process exited");
        }

        Ok(())
    }

    fn backlog(&self) -> i32 {
        PROCESS_BACKLOG
    }
}

/// The body of a pool worker: accept and serve one connection at a time,
/// forever.
pub fn accept_loop(listener: &TcpListener, ctx: &Arc<ServeContext>) -> ! {
    loop {
        if let Some((stream, peer)) = accept(listener) {
            serve_connection(stream, peer, ctx);
        }
    }
}

/// Runs one connection to completion. Failures end the connection only.
pub fn serve_connection(stream: TcpStream, peer: SocketAddr, ctx: &Arc<ServeContext>) {
    debug!(%peer, "Accepted connection");

    let mut conn = Connection::new(stream, Arc::clone(ctx));
    match conn.run() {
        Ok(()) => debug!(%peer, "Connection closed"),
        Err(e) if e.is_transient() => debug!(%peer, error = %e, "Peer went away"),
        Err(e) => error!(%peer, error = %e, "Connection error"),
    }
}

fn accept(listener: &TcpListener) -> Option<(TcpStream, SocketAddr)> {
    match listener.accept() {
        Ok(accepted) => Some(accepted),
        Err(e) => {
            error!(error = %e, "failed to accept a connection");
            None
        }
    }
}

fn wait_for(pid: libc::pid_t) -> io::Result<libc::c_int> {
    let mut status: libc::c_int = 0;

    loop {
        // SAFETY: `pid` is a child of this process and `status` outlives the call.
        let rc = unsafe { libc::waitpid(pid, &mut status, 0) };
        if rc != -1 {
            return Ok(status);
        }

        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
