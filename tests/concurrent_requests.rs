//! Concurrent request tests
//!
//! Many in-flight requests share one registry; no update may be lost.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use observability_demo::{
    config::Config,
    handlers::{self, AppState},
    metrics::OrderStatus,
    simulation::{RandomSimulation, ScriptedSimulation, Simulation},
};
use std::sync::Arc;
use tower::ServiceExt;

fn create_app(simulation: Arc<dyn Simulation>) -> (Router, AppState) {
    let state = AppState::with_simulation(Arc::new(Config::default()), simulation)
        .expect("should create AppState");
    (handlers::router(state.clone()), state)
}

async fn status_of(app: Router, method: &'static str, uri: &'static str) -> StatusCode {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(r#"{"amount":10}"#))
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_counted_exactly() {
    let (app, state) = create_app(Arc::new(RandomSimulation));

    let handles: Vec<_> = (0..100)
        .map(|_| tokio::spawn(status_of(app.clone(), "POST", "/api/orders")))
        .collect();

    let statuses: Vec<StatusCode> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("request task should not panic"))
        .collect();

    let created = statuses
        .iter()
        .filter(|s| **s == StatusCode::CREATED)
        .count() as u64;
    let declined = statuses
        .iter()
        .filter(|s| **s == StatusCode::BAD_REQUEST)
        .count() as u64;

    assert_eq!(created + declined, 100);
    assert_eq!(state.metrics().orders_count(OrderStatus::Success), created);
    assert_eq!(state.metrics().orders_count(OrderStatus::Failed), declined);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_metrics_demo_updates_not_lost() {
    // Every draw is 3: seed, each delta and each burst size
    let requests = 50;
    let simulation = ScriptedSimulation::new().with_ints(std::iter::repeat_n(3, 1 + 2 * requests));
    let (app, state) = create_app(Arc::new(simulation));

    let handles: Vec<_> = (0..requests)
        .map(|_| tokio::spawn(status_of(app.clone(), "GET", "/api/metrics-demo")))
        .collect();

    for result in futures::future::join_all(handles).await {
        assert_eq!(result.unwrap(), StatusCode::OK);
    }

    let metrics = state.metrics();
    assert_eq!(metrics.active_users(), 3 + 3 * requests as i64);
    assert_eq!(
        metrics.orders_count(OrderStatus::Success),
        3 * requests as u64
    );

    let gauge = metrics.registry().get("active_users").unwrap();
    assert_eq!(
        metrics.registry().gauge_value(&gauge, &[]).unwrap(),
        (3 + 3 * requests) as f64
    );
}
