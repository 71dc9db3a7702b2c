//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use loadline::http::connection::ServeContext;
use loadline::http::framer::{Frame, Framer};
use loadline::http::version::HttpVersion;
use loadline::server::dispatch::{Dispatcher, THREAD_BACKLOG, ThreadPerConnection};
use loadline::server::listener;
use tempfile::TempDir;

pub const INDEX: &[u8] = b"<html><body><h1>It works</h1></body></html>\n";

/// A thread-per-connection server on an ephemeral port, serving a temporary
/// document root that holds `index.html`.
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
}

pub fn document_root() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("index.html"), INDEX).unwrap();
    root
}

pub fn context(root: &TempDir, version: HttpVersion) -> Arc<ServeContext> {
    Arc::new(ServeContext {
        root: root.path().to_path_buf(),
        version,
        idle_timeout: Duration::from_secs(5),
    })
}

pub fn local_listener() -> TcpListener {
    listener::bind("127.0.0.1:0".parse().unwrap(), THREAD_BACKLOG).unwrap()
}

pub fn start_server(version: HttpVersion) -> TestServer {
    let root = document_root();
    let listener = local_listener();
    let addr = listener.local_addr().unwrap();
    let ctx = context(&root, version);

    thread::spawn(move || ThreadPerConnection.serve(listener, ctx));

    TestServer { addr, root }
}

pub fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
}

/// Sends `request` and reads one `Content-Length` delimited response.
/// Returns the head as text and the body.
pub fn round_trip(stream: &mut TcpStream, framer: &mut Framer, request: &[u8]) -> (String, Vec<u8>) {
    stream.write_all(request).unwrap();

    let Frame::Complete { body_offset, len } = framer.read_response(stream).unwrap() else {
        panic!("connection closed before the response was complete");
    };

    let head = String::from_utf8_lossy(&framer.buffer()[..body_offset]).into_owned();
    let body = framer.buffer()[body_offset..len].to_vec();
    framer.consume(len);
    (head, body)
}

pub fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions.
    unsafe { libc::geteuid() == 0 }
}
