//! Observability demo service
//!
//! A small HTTP service whose endpoints simulate backend work (variable
//! latency, payment declines, downstream failures) and report every outcome
//! through Prometheus metrics and structured `tracing` events.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod simulation;
pub mod telemetry;
