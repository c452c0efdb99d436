//! User lookup endpoint

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use crate::handlers::AppState;
use crate::metrics::QueryType;

/// Simulated select latency bounds
pub const SELECT_LATENCY_MIN: Duration = Duration::from_millis(50);
pub const SELECT_LATENCY_MAX: Duration = Duration::from_millis(300);

/// `GET /api/users/{user_id}` response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub active: bool,
}

/// Simulates a user lookup with variable latency. Always 200.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<UserResponse> {
    let latency = state
        .simulation()
        .random_duration(SELECT_LATENCY_MIN, SELECT_LATENCY_MAX);

    let query_start = Instant::now();
    tokio::time::sleep(latency).await;
    let query_duration = query_start.elapsed().as_secs_f64();

    state.record(
        "record_query_duration",
        state
            .metrics()
            .record_query_duration(QueryType::Select, query_duration),
    );

    tracing::info!(
        endpoint = "/api/users/{user_id}",
        user_id = %user_id,
        query_duration,
        "User lookup"
    );

    Json(UserResponse {
        username: format!("user_{}", user_id),
        user_id,
        active: true,
    })
}
