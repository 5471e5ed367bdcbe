//! HTTP server for openhouse

pub mod http;

pub use http::{handle_request, run, serve, AppState};
