//! Order creation endpoint
//!
//! Simulates a database insert followed by a payment step that succeeds 90%
//! of the time. Declines are ordinary 400 responses, not faults.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

use crate::handlers::AppState;
use crate::metrics::{OrderStatus, QueryType};

/// Probability that a simulated payment succeeds
pub const ORDER_SUCCESS_PROBABILITY: f64 = 0.9;

/// Simulated insert latency bounds
pub const INSERT_LATENCY_MIN: Duration = Duration::from_millis(10);
pub const INSERT_LATENCY_MAX: Duration = Duration::from_millis(100);

/// Order ID range (inclusive); IDs are random and not unique
pub const ORDER_ID_MIN: i64 = 1000;
pub const ORDER_ID_MAX: i64 = 9999;

/// Order payload with explicit defaults
///
/// Any body is accepted. `amount` is 0 when missing, non-numeric, or when the
/// body is not a JSON object; `customer` is `"unknown"` unless it is a string.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    amount: f64,
    customer: String,
}

impl OrderRequest {
    pub fn from_body(body: &[u8]) -> Self {
        let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

        let amount = value
            .get("amount")
            .and_then(Value::as_f64)
            .filter(|amount| amount.is_finite())
            .unwrap_or(0.0);
        let customer = value
            .get("customer")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        Self { amount, customer }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }
}

/// 201 response body
#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub status: &'static str,
    pub order_id: i64,
}

/// 400 response body
#[derive(Debug, Serialize)]
pub struct OrderDeclined {
    pub status: &'static str,
    pub message: &'static str,
}

/// `POST /api/orders`
pub async fn handler(State(state): State<AppState>, body: Bytes) -> Response {
    let order = OrderRequest::from_body(&body);
    let simulation = state.simulation();
    let metrics = state.metrics();

    let latency = simulation.random_duration(INSERT_LATENCY_MIN, INSERT_LATENCY_MAX);
    let query_start = Instant::now();
    tokio::time::sleep(latency).await;
    let query_duration = query_start.elapsed().as_secs_f64();
    state.record(
        "record_query_duration",
        metrics.record_query_duration(QueryType::Insert, query_duration),
    );

    if simulation.bernoulli(ORDER_SUCCESS_PROBABILITY) {
        let order_id = simulation.random_int(ORDER_ID_MIN, ORDER_ID_MAX);

        state.record("record_order", metrics.record_order(OrderStatus::Success));
        state.record("record_order_value", metrics.record_order_value(order.amount()));

        tracing::info!(
            endpoint = "/api/orders",
            order_id,
            amount = order.amount(),
            customer = order.customer(),
            query_duration,
            "Order created successfully"
        );

        (
            StatusCode::CREATED,
            Json(OrderCreated {
                status: "success",
                order_id,
            }),
        )
            .into_response()
    } else {
        state.record("record_order", metrics.record_order(OrderStatus::Failed));

        tracing::error!(
            endpoint = "/api/orders",
            reason = "payment_declined",
            amount = order.amount(),
            customer = order.customer(),
            query_duration,
            "Order creation failed"
        );

        (
            StatusCode::BAD_REQUEST,
            Json(OrderDeclined {
                status: "error",
                message: "Payment declined",
            }),
        )
            .into_response()
    }
}
