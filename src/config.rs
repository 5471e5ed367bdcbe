//! Configuration for openhouse
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

use crate::types::{CrmError, Result};

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for terminals
    #[default]
    Pretty,
    /// One JSON object per line for log shippers
    Json,
}

/// openhouse - real-estate CRM scheduling and dashboard service
#[derive(Parser, Debug, Clone)]
#[command(name = "openhouse")]
#[command(about = "Leads, showings and dashboard metrics for real-estate agents")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (falls back to an in-memory store when
    /// MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "openhouse")]
    pub mongodb_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Timeout for each document store call, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Length of the dashboard's upcoming-tasks window, in days
    #[arg(long, env = "UPCOMING_WINDOW_DAYS", default_value = "7")]
    pub upcoming_window_days: u64,

    /// Directory holding the server-side copy of the calendar mirror
    /// (optional; without it the mirror lives only in the client)
    #[arg(long, env = "MIRROR_DIR")]
    pub mirror_dir: Option<PathBuf>,
}

impl Args {
    /// Default tracing filter directive
    pub fn log_filter(&self) -> String {
        format!("openhouse={},info", self.log_level)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            return Err(CrmError::Config(
                "REQUEST_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        if self.upcoming_window_days == 0 {
            return Err(CrmError::Config(
                "UPCOMING_WINDOW_DAYS must be greater than zero".to_string(),
            ));
        }

        if self.mongodb_db.trim().is_empty() {
            return Err(CrmError::Config(
                "MONGODB_DB must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
