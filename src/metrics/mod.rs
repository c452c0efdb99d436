//! Prometheus metrics for the demo service
//!
//! This module provides the instruments the handlers record into:
//! - Orders by outcome and order values
//! - Simulated database query latency by query type
//! - The active-user gauge
//! - Per-request HTTP counts and latency
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

pub mod registry;

pub use registry::{
    InstrumentHandle, MetricKind, TelemetryError, TelemetryRegistry, TelemetryResult,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Order outcome label
///
/// Restricts `orders_total` to two time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Success,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Success => "success",
            OrderStatus::Failed => "failed",
        }
    }
}

/// Simulated database query type label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Insert,
    Select,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Insert => "insert",
            QueryType::Select => "select",
        }
    }
}

/// Bucket bounds for `order_value_dollars`
const ORDER_VALUE_BUCKETS: [f64; 9] = [
    10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 750.0, 1000.0, 2500.0,
];

/// Metrics collector for the demo service
///
/// Wraps a [`TelemetryRegistry`] and keeps handles to every instrument the
/// service records into.
pub struct Metrics {
    registry: Arc<TelemetryRegistry>,
    orders_total: InstrumentHandle,
    order_value: InstrumentHandle,
    database_query_duration: InstrumentHandle,
    active_users: InstrumentHandle,
    http_requests_total: InstrumentHandle,
    http_request_duration: InstrumentHandle,
    recording_failures: InstrumentHandle,
    active_user_count: AtomicI64,
}

impl Metrics {
    /// Register all instruments with a fresh registry
    ///
    /// `initial_active_users` seeds the active-user gauge. `version` becomes
    /// the label of the constant `app_info` gauge.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Config`] if registration fails.
    pub fn new(version: &str, initial_active_users: i64) -> TelemetryResult<Self> {
        Self::with_registry(Arc::new(TelemetryRegistry::new()), version, initial_active_users)
    }

    /// Register all instruments with an existing registry
    pub fn with_registry(
        registry: Arc<TelemetryRegistry>,
        version: &str,
        initial_active_users: i64,
    ) -> TelemetryResult<Self> {
        let app_info = registry.register(
            "app_info",
            "Application info",
            MetricKind::Gauge,
            &["version"],
        )?;

        let orders_total = registry.register(
            "orders_total",
            "Total number of orders",
            MetricKind::Counter,
            &["status"],
        )?;

        let order_value = registry.register_histogram(
            "order_value_dollars",
            "Order value in dollars",
            &[],
            ORDER_VALUE_BUCKETS.to_vec(),
        )?;

        let database_query_duration = registry.register(
            "database_query_duration_seconds",
            "Database query duration",
            MetricKind::Histogram,
            &["query_type"],
        )?;

        let active_users = registry.register(
            "active_users",
            "Number of active users",
            MetricKind::Gauge,
            &[],
        )?;

        // Cardinality: route templates, not raw paths (see middleware::http_metrics)
        let http_requests_total = registry.register(
            "http_requests_total",
            "Total number of HTTP requests by method, route and status",
            MetricKind::Counter,
            &["method", "path", "status"],
        )?;

        let http_request_duration = registry.register(
            "http_request_duration_seconds",
            "HTTP request latency in seconds by method and route",
            MetricKind::Histogram,
            &["method", "path"],
        )?;

        let recording_failures = registry.register(
            "metrics_recording_failures_total",
            "Total number of rejected metric operations by operation. \
            Non-zero values indicate an instrumentation bug.",
            MetricKind::Counter,
            &["operation"],
        )?;

        registry.set(&app_info, &[version], 1.0)?;
        for status in [OrderStatus::Success, OrderStatus::Failed] {
            registry.increment(&orders_total, &[status.as_str()], 0.0)?;
        }
        registry.set(&active_users, &[], initial_active_users as f64)?;

        Ok(Self {
            registry,
            orders_total,
            order_value,
            database_query_duration,
            active_users,
            http_requests_total,
            http_request_duration,
            recording_failures,
            active_user_count: AtomicI64::new(initial_active_users),
        })
    }

    pub fn registry(&self) -> &TelemetryRegistry {
        &self.registry
    }

    /// Count one order with the given outcome
    pub fn record_order(&self, status: OrderStatus) -> TelemetryResult<()> {
        self.registry.inc(&self.orders_total, &[status.as_str()])
    }

    pub fn record_order_value(&self, dollars: f64) -> TelemetryResult<()> {
        self.registry.observe(&self.order_value, &[], dollars)
    }

    /// Record a simulated query duration in seconds
    pub fn record_query_duration(
        &self,
        query_type: QueryType,
        seconds: f64,
    ) -> TelemetryResult<()> {
        self.registry
            .observe(&self.database_query_duration, &[query_type.as_str()], seconds)
    }

    /// Apply `delta` to the active-user count and return the new total
    ///
    /// No floor or ceiling: the count may go negative. The gauge is moved with
    /// `add` so it always equals the seed plus the sum of applied deltas, even
    /// when adjustments from concurrent requests interleave.
    pub fn adjust_active_users(&self, delta: i64) -> TelemetryResult<i64> {
        self.registry.add(&self.active_users, &[], delta as f64)?;
        let previous = self.active_user_count.fetch_add(delta, Ordering::SeqCst);
        Ok(previous + delta)
    }

    /// Current active-user count
    pub fn active_users(&self) -> i64 {
        self.active_user_count.load(Ordering::SeqCst)
    }

    /// Record one served HTTP request
    ///
    /// `path` must be a route template or `"unmatched"` to keep cardinality
    /// bounded.
    pub fn record_http_request(
        &self,
        method: &str,
        path: &str,
        status: u16,
        seconds: f64,
    ) -> TelemetryResult<()> {
        let status = status.to_string();
        self.registry
            .inc(&self.http_requests_total, &[method, path, &status])?;
        self.registry
            .observe(&self.http_request_duration, &[method, path], seconds)
    }

    /// Count a rejected metric operation
    ///
    /// Infallible: the failure counter itself has a fixed label arity.
    pub fn metrics_recording_failure(&self, operation: &str) {
        if let Err(e) = self.registry.inc(&self.recording_failures, &[operation]) {
            tracing::error!(error = %e, operation, "Failed to count metrics recording failure");
        }
    }

    /// Number of orders counted with the given outcome
    pub fn orders_count(&self, status: OrderStatus) -> u64 {
        self.registry
            .counter_value(&self.orders_total, &[status.as_str()])
            .map(|v| v as u64)
            .unwrap_or(0)
    }

    /// Number of rejected metric operations for `operation`
    pub fn metrics_recording_failures_count(&self, operation: &str) -> u64 {
        self.registry
            .counter_value(&self.recording_failures, &[operation])
            .map(|v| v as u64)
            .unwrap_or(0)
    }

    /// Gather all metrics and encode them in Prometheus text format
    pub fn gather(&self) -> TelemetryResult<String> {
        self.registry.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new_registers_and_seeds() {
        let metrics = Metrics::new("1.2.3", 25).expect("Failed to create metrics");

        assert_eq!(metrics.active_users(), 25);

        let output = metrics.gather().unwrap();
        assert!(output.contains("app_info{version=\"1.2.3\"} 1"));
        assert!(output.contains("active_users 25"));
    }

    #[test]
    fn test_record_order_by_status() {
        let metrics = Metrics::new("1.0.0", 10).unwrap();

        metrics.record_order(OrderStatus::Success).unwrap();
        metrics.record_order(OrderStatus::Success).unwrap();
        metrics.record_order(OrderStatus::Failed).unwrap();

        assert_eq!(metrics.orders_count(OrderStatus::Success), 2);
        assert_eq!(metrics.orders_count(OrderStatus::Failed), 1);

        let output = metrics.gather().unwrap();
        assert!(output.contains("orders_total{status=\"success\"} 2"));
        assert!(output.contains("orders_total{status=\"failed\"} 1"));
    }

    #[test]
    fn test_adjust_active_users_allows_negative() {
        let metrics = Metrics::new("1.0.0", 3).unwrap();

        assert_eq!(metrics.adjust_active_users(-5).unwrap(), -2);
        assert_eq!(metrics.adjust_active_users(10).unwrap(), 8);
        assert_eq!(metrics.active_users(), 8);

        let handle = metrics.registry().get("active_users").unwrap();
        assert_eq!(metrics.registry().gauge_value(&handle, &[]).unwrap(), 8.0);
    }

    #[test]
    fn test_record_query_duration_labels() {
        let metrics = Metrics::new("1.0.0", 10).unwrap();

        metrics.record_query_duration(QueryType::Insert, 0.05).unwrap();
        metrics.record_query_duration(QueryType::Select, 0.2).unwrap();

        let output = metrics.gather().unwrap();
        assert!(output.contains("database_query_duration_seconds_count{query_type=\"insert\"} 1"));
        assert!(output.contains("database_query_duration_seconds_count{query_type=\"select\"} 1"));
    }

    #[test]
    fn test_record_order_value_rejects_nan() {
        let metrics = Metrics::new("1.0.0", 10).unwrap();
        let err = metrics.record_order_value(f64::NAN).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidOperation { .. }));
    }

    #[test]
    fn test_metrics_recording_failure_counts() {
        let metrics = Metrics::new("1.0.0", 10).unwrap();

        metrics.metrics_recording_failure("record_order_value");
        metrics.metrics_recording_failure("record_order_value");

        assert_eq!(metrics.metrics_recording_failures_count("record_order_value"), 2);
        assert_eq!(metrics.metrics_recording_failures_count("record_order"), 0);
    }

    #[test]
    fn test_shared_registry_rejects_conflicting_definition() {
        let registry = Arc::new(TelemetryRegistry::new());
        registry
            .register("orders_total", "Orders", MetricKind::Gauge, &["status"])
            .unwrap();

        let result = Metrics::with_registry(registry, "1.0.0", 10);
        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }
}
