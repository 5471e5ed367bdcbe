//! Error types for openhouse
//!
//! Every store-layer failure is translated into one of these kinds at the
//! repository boundary. The `Display` text is for logs; HTTP callers only
//! ever see [`CrmError::public_message`] and [`CrmError::code`].

use hyper::StatusCode;

/// Main error type for openhouse operations
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// Missing or malformed required input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation targeted an identifier that names no document
    #[error("Not found: {0}")]
    NotFound(String),

    /// A reference identifier is not a well-formed store identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The document store connection or query failed (timeouts included)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrmError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for response bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to return to a caller.
    ///
    /// Client errors echo their detail; server-side errors collapse to a
    /// generic sentence so store internals never leak.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) | Self::InvalidIdentifier(msg) => {
                msg.clone()
            }
            Self::StoreUnavailable(_) => "Document store unavailable".to_string(),
            Self::Config(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<std::io::Error> for CrmError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for CrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("JSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for CrmError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for CrmError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::StoreUnavailable("store call timed out".to_string())
    }
}

/// Result type alias for openhouse operations
pub type Result<T> = std::result::Result<T, CrmError>;
