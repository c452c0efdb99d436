//! Command-line interface for the demo service
//!
//! Provides argument parsing and subcommand handling for the binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Demo HTTP service emitting logs and Prometheus metrics
#[derive(Parser)]
#[command(name = "observability-demo")]
#[command(version)]
#[command(about = "Demo HTTP service emitting structured logs and Prometheus metrics")]
#[command(
    long_about = "Serves a handful of endpoints that simulate database latency, payment \
    failures and downstream errors, recording every outcome as Prometheus metrics \
    (exposed at /metrics) and structured log events."
)]
pub struct Cli {
    /// Path to configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Observability Demo Configuration
# ================================
#
# Every section and key is optional; the values below are the defaults.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 5002

# ─────────────────────────────────────────────────────────────────────────────
# SERVICE IDENTITY
# ─────────────────────────────────────────────────────────────────────────────

[service]
# Reported by GET /
name = "Observability Demo"

# Exported as app_info{version="..."} 1
version = "1.0.0"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Log format: "text" for humans, "json" for log shippers
log_format = "text"

# Prometheus metrics are always available at /metrics on the server port
"#
}
