//! Service landing endpoint

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::USER_AGENT},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::handlers::AppState;

/// `GET /` response
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub service: String,
    pub status: &'static str,
    /// Current UTC time, RFC 3339 / ISO-8601
    pub timestamp: String,
}

/// Returns service name, `"running"` and the current UTC timestamp. Always 200.
pub async fn handler(State(state): State<AppState>, headers: HeaderMap) -> Json<HomeResponse> {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info!(endpoint = "/", user_agent, "Home endpoint accessed");

    Json(HomeResponse {
        service: state.config().service.name.clone(),
        status: "running",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    })
}
