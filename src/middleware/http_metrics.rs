//! Per-request HTTP metrics
//!
//! Counts every request by method, route template and status and records its
//! latency. Labels use the matched route template (`/api/users/{user_id}`),
//! never the raw path, so user input cannot create new time series.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use crate::handlers::AppState;

/// Path label for requests that hit the fallback
pub const UNMATCHED_PATH_LABEL: &str = "unmatched";

/// Routes excluded from HTTP metrics so scrapes do not change what they read
const EXCLUDED_PATHS: [&str; 1] = ["/metrics"];

/// Response extension set by the fallback handler
#[derive(Debug, Clone, Copy)]
pub struct UnmatchedRoute;

/// Middleware recording `http_requests_total` and `http_request_duration_seconds`
pub async fn track_http_metrics(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let matched = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned());

    if matched
        .as_deref()
        .is_some_and(|path| EXCLUDED_PATHS.contains(&path))
    {
        return next.run(request).await;
    }

    let method = request.method().as_str().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    let path = match matched {
        Some(path) if response.extensions().get::<UnmatchedRoute>().is_none() => path,
        _ => UNMATCHED_PATH_LABEL.to_owned(),
    };
    let status = response.status().as_u16();

    let metrics = state.metrics();
    if let Err(e) = metrics.record_http_request(&method, &path, status, elapsed) {
        tracing::error!(
            error = %e,
            method = %method,
            path = %path,
            status,
            "Metrics recording failed (non-fatal). Request will continue."
        );
        metrics.metrics_recording_failure("record_http_request");
    }

    response
}
