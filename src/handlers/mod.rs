//! HTTP request handlers for the demo API

use crate::config::Config;
use crate::error::AppResult;
use crate::metrics::{Metrics, TelemetryResult};
use crate::middleware::{http_metrics, request_id};
use crate::simulation::{RandomSimulation, Simulation};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub mod demo;
pub mod errors;
pub mod fallback;
pub mod health;
pub mod home;
pub mod metrics;
pub mod orders;
pub mod slow;
pub mod users;

/// Application state shared across all handlers
///
/// Contains configuration, the metrics collector and the simulation source.
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    metrics: Arc<Metrics>,
    simulation: Arc<dyn Simulation>,
}

impl AppState {
    /// Create a new AppState backed by [`RandomSimulation`]
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        Self::with_simulation(config, Arc::new(RandomSimulation))
    }

    /// Create a new AppState with an explicit simulation source
    ///
    /// The active-user gauge is seeded from `simulation` with a value in [10, 50].
    pub fn with_simulation(
        config: Arc<Config>,
        simulation: Arc<dyn Simulation>,
    ) -> AppResult<Self> {
        let initial_active_users = simulation.random_int(10, 50);
        let metrics = Metrics::new(&config.service.version, initial_active_users)?;

        Ok(Self {
            config,
            metrics: Arc::new(metrics),
            simulation,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn simulation(&self) -> &dyn Simulation {
        self.simulation.as_ref()
    }

    /// Log-and-continue for a metric operation
    ///
    /// Rejected operations never fail the request; they are logged and
    /// counted in `metrics_recording_failures_total`.
    pub(crate) fn record(&self, operation: &'static str, result: TelemetryResult<()>) {
        if let Err(e) = result {
            tracing::error!(
                error = %e,
                operation,
                "Metrics recording failed (non-fatal). Request will continue."
            );
            self.metrics.metrics_recording_failure(operation);
        }
    }
}

/// Build the application router with all routes and middleware
///
/// Layers, outermost first: request ID, tracing span, HTTP metrics, panic
/// capture.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .route("/api/orders", post(orders::handler))
        .route("/api/users/{user_id}", get(users::handler))
        .route("/api/slow", get(slow::handler))
        .route("/api/error", get(errors::handler))
        .route("/api/metrics-demo", get(demo::handler))
        .fallback(fallback::not_found)
        .layer(CatchPanicLayer::custom(fallback::handle_panic))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            http_metrics::track_http_metrics,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(request_id::make_span))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
