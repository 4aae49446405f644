//! HTTP server for Greenway

pub mod http;

pub use http::{run, AppState};
