//! openhouse - scheduling and dashboard service for a real-estate CRM
//!
//! Tracks leads, property showings, calendar events and per-lead tasks,
//! and serves the metrics an agent's dashboard displays.
//!
//! ## Components
//!
//! - **db**: document store gateway (MongoDB or in-memory), identity
//!   normalization and the typed Lead/Event models
//! - **repo**: CRUD repositories for leads and events
//! - **schedule**: calendar reconciliation with the client mirror, date
//!   buckets and dashboard metrics
//! - **server** / **routes**: the JSON REST surface

pub mod config;
pub mod db;
pub mod logging;
pub mod repo;
pub mod routes;
pub mod schedule;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{CrmError, Result};
