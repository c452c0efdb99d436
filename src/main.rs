//! Observability demo HTTP server
//!
//! Starts an Axum web server exposing the simulated API and `/metrics`.

use clap::Parser;
use observability_demo::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote config template to {}", path.display());
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize telemetry
    telemetry::init(
        &config.observability.log_level,
        config.observability.log_format,
    );

    let addr = config.server.socket_addr()?;
    let service_name = config.service.name.clone();
    let version = config.service.version.clone();

    // Registers every metric; a conflicting definition aborts startup here
    let state = AppState::new(Arc::new(config))?;

    tracing::info!(
        service = %service_name,
        version = %version,
        active_users = state.metrics().active_users(),
        "Starting {} on {}",
        service_name,
        addr
    );
    tracing::info!("Metrics available at http://{}/metrics", addr);

    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
