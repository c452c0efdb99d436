//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.

use crate::config::LogFormat;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Default filter directives for `level`
///
/// Applies to this crate and to tower-http's request spans.
pub fn default_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    format!("observability_demo={},tower_http={}", level, level)
}

/// Initialize tracing subscriber for structured logging
///
/// This can only be called once per process. Subsequent calls are silently ignored.
///
/// Reads log level from RUST_LOG environment variable, defaulting to the
/// level specified in config (or "info" if not set).
///
/// # Examples
///
/// ```no_run
/// use observability_demo::config::LogFormat;
///
/// observability_demo::telemetry::init("info", LogFormat::Text);
/// tracing::info!("Application started");
/// ```
pub fn init(default_level: &str, format: LogFormat) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

        let registry = tracing_subscriber::registry().with(filter);
        match format {
            LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
                .init(),
        }
    });
}
