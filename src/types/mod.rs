//! Shared types for openhouse

mod error;

pub use error::{CrmError, Result};
