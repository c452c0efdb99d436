//! Integration tests for metrics recorded by the handlers
//!
//! These tests drive the full router and read the results back through
//! `/metrics`, the same way a Prometheus scraper would.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use observability_demo::{
    config::Config,
    handlers::{self, AppState},
    simulation::{ScriptedSimulation, Simulation},
};
use std::sync::Arc;
use tower::ServiceExt;

fn create_app(simulation: Arc<dyn Simulation>) -> (Router, AppState) {
    let state = AppState::with_simulation(Arc::new(Config::default()), simulation)
        .expect("should create AppState");
    (handlers::router(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn scrape(app: &Router) -> String {
    let (status, body) = send(app, "GET", "/metrics", "").await;
    assert_eq!(status, StatusCode::OK);
    body
}

/// Value of the sample `name{labels}` in an exposition snapshot
fn sample(snapshot: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    snapshot
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let (metric, label_str) = match series.split_once('{') {
                Some((metric, rest)) => (metric, rest.trim_end_matches('}')),
                None => (series, ""),
            };
            if metric != name {
                return None;
            }
            let pairs: Vec<&str> = if label_str.is_empty() {
                Vec::new()
            } else {
                label_str.split(',').collect()
            };
            let matches = pairs.len() == labels.len()
                && labels
                    .iter()
                    .all(|(k, v)| pairs.contains(&format!("{}=\"{}\"", k, v).as_str()));
            if matches { value.parse().ok() } else { None }
        })
}

#[tokio::test(start_paused = true)]
async fn test_orders_total_counts_orders_and_demo_bursts() {
    // ints: seed, order id, demo delta, demo burst
    let simulation = ScriptedSimulation::new()
        .with_ints([20, 1234, 4, 3])
        .with_outcomes([true, false]);
    let (app, _) = create_app(Arc::new(simulation));

    let (status, _) = send(&app, "POST", "/api/orders", r#"{"amount":100}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", "/api/orders", r#"{"amount":100}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "GET", "/api/metrics-demo", "").await;
    assert_eq!(status, StatusCode::OK);

    let snapshot = scrape(&app).await;
    assert_eq!(sample(&snapshot, "orders_total", &[("status", "success")]), Some(4.0));
    assert_eq!(sample(&snapshot, "orders_total", &[("status", "failed")]), Some(1.0));
    assert_eq!(sample(&snapshot, "order_value_dollars_count", &[]), Some(4.0));
    assert_eq!(sample(&snapshot, "active_users", &[]), Some(24.0));
}

#[tokio::test]
async fn test_orders_total_present_before_any_order() {
    let (app, _) = create_app(Arc::new(ScriptedSimulation::new()));

    let snapshot = scrape(&app).await;

    assert!(snapshot.contains("# TYPE orders_total counter"));
    assert_eq!(sample(&snapshot, "orders_total", &[("status", "success")]), Some(0.0));
    assert_eq!(sample(&snapshot, "orders_total", &[("status", "failed")]), Some(0.0));
}

#[tokio::test]
async fn test_metrics_demo_gauge_tracks_sum_of_deltas() {
    let deltas = [-5, 10, 3, -2, 0, 7, -5];
    let mut ints = vec![12];
    for delta in deltas {
        ints.push(delta);
        ints.push(1); // burst size
    }
    let (app, state) = create_app(Arc::new(ScriptedSimulation::new().with_ints(ints)));

    let mut last_reported = 0;
    for _ in deltas {
        let (status, body) = send(&app, "GET", "/api/metrics-demo", "").await;
        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["message"], "Metrics generated");
        last_reported = body["active_users"].as_i64().unwrap();
    }

    let expected = 12 + deltas.iter().sum::<i64>();
    assert_eq!(last_reported, expected);
    assert_eq!(state.metrics().active_users(), expected);

    let snapshot = scrape(&app).await;
    assert_eq!(sample(&snapshot, "active_users", &[]), Some(expected as f64));
    assert_eq!(
        sample(&snapshot, "orders_total", &[("status", "success")]),
        Some(deltas.len() as f64)
    );
}

#[tokio::test]
async fn test_active_users_can_go_negative() {
    let simulation = ScriptedSimulation::new().with_ints([10, -5, 1, -5, 1, -5, 1]);
    let (app, _) = create_app(Arc::new(simulation));

    for _ in 0..2 {
        send(&app, "GET", "/api/metrics-demo", "").await;
    }
    let (_, body) = send(&app, "GET", "/api/metrics-demo", "").await;

    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["active_users"], -5);
}

#[tokio::test(start_paused = true)]
async fn test_scrape_is_idempotent() {
    let simulation = ScriptedSimulation::new().with_outcomes([true]);
    let (app, _) = create_app(Arc::new(simulation));
    send(&app, "POST", "/api/orders", r#"{"amount":50}"#).await;

    let first = scrape(&app).await;
    let second = scrape(&app).await;

    assert_eq!(first, second, "reading /metrics must not change what it reports");
}

#[tokio::test]
async fn test_metrics_content_type() {
    let (app, _) = create_app(Arc::new(ScriptedSimulation::new()));

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
    assert!(content_type.contains("version=0.0.4"));
}

#[tokio::test]
async fn test_snapshot_families_sorted_by_name() {
    let (app, _) = create_app(Arc::new(ScriptedSimulation::new()));
    send(&app, "GET", "/health", "").await;

    let snapshot = scrape(&app).await;
    let names: Vec<&str> = snapshot
        .lines()
        .filter_map(|line| line.strip_prefix("# TYPE "))
        .filter_map(|rest| rest.split_whitespace().next())
        .collect();

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(names.contains(&"app_info"));
    assert!(names.contains(&"http_requests_total"));
}

#[tokio::test(start_paused = true)]
async fn test_http_metrics_use_route_templates() {
    let (app, _) = create_app(Arc::new(ScriptedSimulation::new()));

    send(&app, "GET", "/api/users/1", "").await;
    send(&app, "GET", "/api/users/2", "").await;
    send(&app, "GET", "/nope", "").await;
    send(&app, "GET", "/health", "").await;

    let snapshot = scrape(&app).await;
    assert_eq!(
        sample(
            &snapshot,
            "http_requests_total",
            &[("method", "GET"), ("path", "/api/users/{user_id}"), ("status", "200")]
        ),
        Some(2.0)
    );
    assert_eq!(
        sample(
            &snapshot,
            "http_requests_total",
            &[("method", "GET"), ("path", "unmatched"), ("status", "404")]
        ),
        Some(1.0)
    );
    assert_eq!(
        sample(
            &snapshot,
            "http_request_duration_seconds_count",
            &[("method", "GET"), ("path", "/health")]
        ),
        Some(1.0)
    );
    assert!(!snapshot.contains("path=\"/api/users/1\""));
    assert!(!snapshot.contains("path=\"/metrics\""));
}

#[tokio::test]
async fn test_app_info_reports_version() {
    let config: Config = toml::from_str("[service]\nversion = \"9.9.9\"").unwrap();
    let state = AppState::new(Arc::new(config)).unwrap();
    let app = handlers::router(state);

    let snapshot = scrape(&app).await;
    assert_eq!(sample(&snapshot, "app_info", &[("version", "9.9.9")]), Some(1.0));
}
