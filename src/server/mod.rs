//! Listening socket setup and connection dispatch.

pub mod dispatch;
pub mod listener;

pub use crate::http::connection::ServeContext;
pub use dispatch::{Dispatcher, ProcessPool, ThreadPerConnection};
