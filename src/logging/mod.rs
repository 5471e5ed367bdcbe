//! Logging infrastructure for openhouse
//!
//! A `tracing-subscriber` registry with an `EnvFilter` (`RUST_LOG` wins over
//! the configured level) and either the pretty or the JSON fmt layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Filter from `RUST_LOG`, or `default_directive` when it is unset or invalid
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(default_directive: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(default_directive));

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false),
            )
            .init(),
    }
}
