//! HTTP/1.0 and HTTP/1.1 protocol implementation.
//!
//! Only what a static file server and its benchmark client need: framing by
//! `Content-Length`, request line validation, and connection persistence.
//!
//! # Architecture
//!
//! - **`framer`**: finds message boundaries in a partially delivered byte stream
//! - **`request`**: request line parsing and validation
//! - **`response`**: status codes and response heads
//! - **`writer`**: serializes requests and streams responses
//! - **`resource`**: maps request targets to files under the document root
//! - **`persistence`**: decides whether a connection outlives an exchange
//! - **`connection`**: the server-side request-response state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Frame the next request
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Validate, resolve the file
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Stream head and body
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpListener;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use loadline::http::connection::{Connection, ServeContext};
//! use loadline::http::version::HttpVersion;
//!
//! fn main() -> std::io::Result<()> {
//!     let ctx = Arc::new(ServeContext {
//!         root: "www".into(),
//!         version: HttpVersion::Http11,
//!         idle_timeout: Duration::from_secs(300),
//!     });
//!     let listener = TcpListener::bind("127.0.0.1:8080")?;
//!
//!     for stream in listener.incoming() {
//!         let ctx = Arc::clone(&ctx);
//!         let stream = stream?;
//!         std::thread::spawn(move || {
//!             let mut conn = Connection::new(stream, ctx);
//!             if let Err(e) = conn.run() {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod framer;
pub mod persistence;
pub mod request;
pub mod resource;
pub mod response;
pub mod version;
pub mod writer;
