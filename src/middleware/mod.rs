//! Axum middleware shared by every route

pub mod http_metrics;
pub mod request_id;
