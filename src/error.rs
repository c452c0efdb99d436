//! Error types for the demo service
//!
//! All errors implement `IntoResponse` for Axum handlers. Only the two
//! client-visible bodies ever leave the process: `{"error":"Not found"}` and
//! `{"error":"Internal server error"}`. Everything else is logged.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::metrics::TelemetryError;

/// Body sent for every fault surfaced as 500
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Body sent for unmatched routes
pub const NOT_FOUND_MESSAGE: &str = "Not found";

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config file '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("No route for {method} {path}")]
    NotFound { method: String, path: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
            _ => {
                tracing::error!(error = %self, "500 Internal Server Error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
