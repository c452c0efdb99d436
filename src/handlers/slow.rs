//! Intentionally slow endpoint

use axum::{Json, extract::State};
use serde::Serialize;
use std::time::Duration;

use crate::handlers::AppState;

pub const SLOW_MIN: Duration = Duration::from_secs(1);
pub const SLOW_MAX: Duration = Duration::from_secs(3);

/// `GET /api/slow` response
#[derive(Debug, Serialize)]
pub struct SlowResponse {
    pub message: &'static str,
    /// Seconds slept
    pub duration: f64,
}

/// Sleeps a random 1 to 3 seconds, then reports the duration used
pub async fn handler(State(state): State<AppState>) -> Json<SlowResponse> {
    let duration = state.simulation().random_duration(SLOW_MIN, SLOW_MAX);
    let seconds = duration.as_secs_f64();

    tracing::warn!(
        endpoint = "/api/slow",
        expected_duration = seconds,
        "Slow endpoint accessed - will take {:.2}s",
        seconds
    );

    tokio::time::sleep(duration).await;

    Json(SlowResponse {
        message: "This was intentionally slow",
        duration: seconds,
    })
}
