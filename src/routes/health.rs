//! Health check endpoints
//!
//! Kubernetes-style probes:
//! - /health, /healthz - Liveness probe (is the service running?)
//! - /ready, /readyz - Readiness probe (does the document store answer?)

use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::warn;

use super::{json_response, FullBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    /// Service version
    pub version: &'static str,
    /// Seconds since startup
    pub uptime: u64,
    /// Current timestamp
    pub timestamp: String,
    /// Operating mode
    pub mode: &'static str,
    /// Node identifier
    pub node_id: String,
    /// Document store backend ("mongodb" or "memory")
    pub store: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub store: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        node_id: state.args.node_id.to_string(),
        store: state.store.backend(),
    }
}

/// Handle liveness probe (/health, /healthz). Always 200 while running.
pub fn health_check(state: &AppState) -> Response<FullBody> {
    json_response(StatusCode::OK, &build_health_response(state))
}

/// Handle readiness probe (/ready, /readyz)
///
/// Pings the document store under the request timeout; 503 when it does
/// not answer.
pub async fn readiness_check(state: &AppState) -> Response<FullBody> {
    let store = state.store.backend();
    match state.timed(state.store.ping()).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &ReadinessResponse {
                ready: true,
                store,
                error: None,
            },
        ),
        Err(e) => {
            warn!(store, error = %e, "Readiness check failed");
            json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &ReadinessResponse {
                    ready: false,
                    store,
                    error: Some(e.public_message()),
                },
            )
        }
    }
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
            build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
            service: "openhouse",
        },
    )
}
