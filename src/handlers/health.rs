//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check handler
///
/// Always returns 200 OK with `{"status":"healthy"}`.
pub async fn handler() -> (StatusCode, Json<HealthResponse>) {
    tracing::info!(endpoint = "/health", "Health check accessed");

    (StatusCode::OK, Json(HealthResponse { status: "healthy" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler_returns_ok() {
        let (status, Json(body)) = handler().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"status": "healthy"})
        );
    }
}
