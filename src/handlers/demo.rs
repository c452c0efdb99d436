//! Metrics generator endpoint
//!
//! Moves the active-user gauge and records a small burst of synthetic orders
//! so dashboards have something to draw.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::handlers::AppState;
use crate::metrics::OrderStatus;

pub const ACTIVE_USER_DELTA_MIN: i64 = -5;
pub const ACTIVE_USER_DELTA_MAX: i64 = 10;
pub const BURST_MIN: i64 = 1;
pub const BURST_MAX: i64 = 5;
pub const ORDER_VALUE_MIN: f64 = 10.0;
pub const ORDER_VALUE_MAX: f64 = 1000.0;

/// `GET /api/metrics-demo` response
#[derive(Debug, Serialize)]
pub struct MetricsDemoResponse {
    pub message: &'static str,
    pub active_users: i64,
}

pub async fn handler(State(state): State<AppState>) -> Json<MetricsDemoResponse> {
    let simulation = state.simulation();
    let metrics = state.metrics();

    let delta = simulation.random_int(ACTIVE_USER_DELTA_MIN, ACTIVE_USER_DELTA_MAX);
    let active_users = match metrics.adjust_active_users(delta) {
        Ok(total) => total,
        Err(e) => {
            state.record("adjust_active_users", Err(e));
            metrics.active_users()
        }
    };

    let burst = simulation.random_int(BURST_MIN, BURST_MAX);
    for _ in 0..burst {
        let value = simulation.uniform(ORDER_VALUE_MIN, ORDER_VALUE_MAX);
        state.record("record_order", metrics.record_order(OrderStatus::Success));
        state.record("record_order_value", metrics.record_order_value(value));
    }

    tracing::info!(
        endpoint = "/api/metrics-demo",
        delta,
        active_users,
        orders_generated = burst,
        "Metrics generated"
    );

    Json(MetricsDemoResponse {
        message: "Metrics generated",
        active_users,
    })
}
