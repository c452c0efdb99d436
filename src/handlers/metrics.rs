//! Prometheus metrics endpoint
//!
//! Exposes metrics in Prometheus text format for scraping.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::handlers::AppState;

/// Metrics handler for Prometheus scraping
///
/// # Response
///
/// - `200 OK` with metrics in Prometheus text format
/// - `500 Internal Server Error` if encoding fails (detail is only logged)
///
/// # Example
///
/// ```bash
/// curl http://localhost:5002/metrics
/// # HELP orders_total Total number of orders
/// # TYPE orders_total counter
/// orders_total{status="success"} 42
/// ```
pub async fn handler(State(state): State<AppState>) -> Response {
    let registry = state.metrics().registry();
    match registry.snapshot() {
        Ok(output) => {
            tracing::info!(
                endpoint = "/metrics",
                bytes = output.len(),
                "Metrics scraped"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, registry.content_type())],
                output,
            )
                .into_response()
        }
        // AppError logs the failure as it renders the 500
        Err(e) => AppError::from(e).into_response(),
    }
}
