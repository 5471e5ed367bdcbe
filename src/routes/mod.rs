//! HTTP route handlers
//!
//! Handlers take the shared state plus the already-collected body or query
//! string and always produce a response; errors become
//! `{"error": ..., "code": ...}` bodies with the matching status.

pub mod calendar;
pub mod dashboard;
pub mod events;
pub mod health;
pub mod leads;

pub use calendar::{add_showing, reconcile_calendar};
pub use dashboard::dashboard;
pub use events::{create_event, delete_event, list_events, update_event};
pub use health::{health_check, readiness_check, version_info};
pub use leads::{create_lead, delete_lead, list_leads, update_lead};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use tracing::warn;

use crate::types::{CrmError, Result};

pub type FullBody = Full<Bytes>;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// Error body for a failed operation. Server-side detail stays in the logs.
pub(crate) fn error_response(err: &CrmError) -> Response<FullBody> {
    let status = err.status_code();
    if status.is_server_error() {
        warn!(code = err.code(), error = %err, "Request failed");
    }
    json_response(
        status,
        &ErrorResponse {
            error: err.public_message(),
            code: err.code(),
        },
    )
}

/// 200 with the serialized value, or the error response
pub(crate) fn respond<T: Serialize>(result: Result<T>) -> Response<FullBody> {
    match result {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(e) => error_response(&e),
    }
}

/// Parse a JSON request body
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| CrmError::Validation(format!("Invalid JSON: {}", e)))
}

/// First value of `key` in a query string, form-decoded (`+` is a space)
pub(crate) fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, raw)| {
            let spaced = raw.replace('+', " ");
            urlencoding::decode(&spaced)
                .map(Cow::into_owned)
                .unwrap_or(spaced)
        })
}

/// Path segment, percent-decoded
pub(crate) fn path_id(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}
