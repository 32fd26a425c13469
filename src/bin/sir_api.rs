//! SIR Pulse API Server
//!
//! Serves the monitor's latest snapshots as JSON
//!
//! Usage:
//!   cargo run --bin sir_api
//!
//! Environment:
//!   PORT / SIR_PORT - Server port (default: 8080)
//!   SIR_HOST        - Server host (default: 0.0.0.0)
//!   RUST_LOG        - Log filter (default: info)

use sir_pulse::api::{create_router, start_cleanup_task, AppState};
use sir_pulse::{AggregatorConfig, NetworkMonitor};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AggregatorConfig::from_env()?;
    let monitor = Arc::new(NetworkMonitor::start(&config)?);
    let state = Arc::new(AppState::new(monitor.clone()));

    start_cleanup_task();
    info!("🧹 Rate limiter cleanup task started");

    let app = create_router(state);

    // PORT is what most hosting platforms set; SIR_PORT for local runs
    let host = std::env::var("SIR_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("SIR_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("🚀 SIR Pulse API starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /v1/networks        - Poll state of every network");
    info!("  GET  /v1/networks/:id    - Poll state of one network");
    info!("  GET  /v1/summary         - Headline fields per network");
    info!("  GET  /v1/developers      - Developer activity");
    info!("  GET  /v1/health          - Health check");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🔌 Shutdown signal received, stopping pollers...");
    monitor.stop();
    info!("👋 SIR Pulse API shutdown complete");

    Ok(())
}
