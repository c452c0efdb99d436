//! Error injection endpoint
//!
//! Returns one of a fixed set of error responses. These are business
//! outcomes chosen by the handler, not faults.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;
use crate::simulation::choice;

/// A simulated failure: status, client message and machine-readable reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedError {
    pub status: StatusCode,
    pub message: &'static str,
    pub reason: &'static str,
}

/// The failures `/api/error` picks from, uniformly
pub const SIMULATED_ERRORS: [SimulatedError; 3] = [
    SimulatedError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "Internal Server Error",
        reason: "database_connection_failed",
    },
    SimulatedError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: "Service Unavailable",
        reason: "downstream_service_timeout",
    },
    SimulatedError {
        status: StatusCode::TOO_MANY_REQUESTS,
        message: "Too Many Requests",
        reason: "rate_limit_exceeded",
    },
];

/// `GET /api/error` response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub reason: &'static str,
}

pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<ErrorResponse>) {
    let picked = choice(state.simulation(), &SIMULATED_ERRORS)
        .copied()
        .unwrap_or(SIMULATED_ERRORS[0]);

    tracing::error!(
        endpoint = "/api/error",
        status_code = picked.status.as_u16(),
        reason = picked.reason,
        "Error endpoint triggered"
    );

    (
        picked.status,
        Json(ErrorResponse {
            error: picked.message,
            reason: picked.reason,
        }),
    )
}
