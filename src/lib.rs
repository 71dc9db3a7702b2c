//! loadline - HTTP/1.0 and HTTP/1.1 static file server and load generator
//!
//! Core library shared by the `loadline` server and the `loadline-bench`
//! client.

pub mod client;
pub mod config;
pub mod http;
pub mod logging;
pub mod server;
pub mod stats;
