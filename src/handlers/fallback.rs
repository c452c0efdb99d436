//! Unmatched routes and handler panics

use axum::{
    http::{Method, Uri},
    response::{IntoResponse, Response},
};
use std::any::Any;

use crate::error::AppError;
use crate::middleware::http_metrics::UnmatchedRoute;

/// Router fallback: 404 `{"error":"Not found"}`
pub async fn not_found(method: Method, uri: Uri) -> Response {
    tracing::warn!(path = %uri.path(), method = %method, "404 Not Found");

    let mut response = AppError::NotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
    .into_response();
    response.extensions_mut().insert(UnmatchedRoute);
    response
}

/// Panic responder for `CatchPanicLayer`
///
/// The panic payload is logged; the client only sees the generic 500 body.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}
