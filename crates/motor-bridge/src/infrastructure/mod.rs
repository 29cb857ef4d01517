//! Infrastructure layer: HTTP listener, static file resolver, serial channel.

pub mod http;
pub mod serial;
pub mod static_files;

pub use http::{run_server, HttpListener, Router};
