//! SIR Pulse - live per-network metric aggregation
//!
//! Console runner: polls every configured network, logs a one-line summary
//! whenever a snapshot lands, and stops cleanly on Ctrl+C.
//!
//! Environment:
//!   SIR_NETWORKS         - comma list (default: all)
//!   SIR_REFRESH_MS       - snapshot interval (default: 30000)
//!   SIR_FETCH_TIMEOUT_MS - per-call timeout (default: 10000)
//!   RUST_LOG             - log filter (default: info)

use eyre::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sir_pulse::models::types::{DataQuality, Field, NetworkSnapshot};
use sir_pulse::utils::constants::{APP_NAME, APP_VERSION};
use sir_pulse::{AggregatorConfig, NetworkMonitor, PollState};

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("🛰️ {} v{}", APP_NAME, APP_VERSION);

    let config = AggregatorConfig::from_env()?;
    info!(
        "⚙️ {} networks, refresh {:?}, timeout {:?}",
        config.networks.len(),
        config.refresh_interval,
        config.fetch_timeout
    );

    let monitor = Arc::new(NetworkMonitor::start(&config)?);

    for network in monitor.networks() {
        let Some(poller) = monitor.poller(network) else {
            continue;
        };
        let mut rx = poller.subscribe();
        tokio::spawn(async move {
            let mut last: Option<Arc<NetworkSnapshot>> = None;
            while rx.changed().await.is_ok() {
                let state: PollState<NetworkSnapshot> = rx.borrow_and_update().clone();
                if let Some(error) = &state.error {
                    warn!("⚠️ {}: {}", network, error);
                }
                let Some(snapshot) = state.snapshot else {
                    continue;
                };
                if last.as_ref().is_some_and(|prev| Arc::ptr_eq(prev, &snapshot)) {
                    continue;
                }
                info!("{}", summary_line(&snapshot));
                last = Some(snapshot);
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    info!("🛑 Shutting down gracefully...");

    monitor.stop();

    let latest = monitor.all_latest();
    info!("📊 Final snapshots ({} of {} networks):", latest.len(), monitor.networks().len());
    for snapshot in latest.values() {
        info!("   {}", summary_line(snapshot));
    }

    Ok(())
}

fn summary_line(s: &NetworkSnapshot) -> String {
    let tag = |field: Field| match s.quality(field) {
        Some(DataQuality::Live) => "",
        _ => "*",
    };

    format!(
        "{:<9} tps {}{} | gas {}{} | finality {}{} | uptime {}%{} | mcap {}{} | tvl {}{} | {}/{} live",
        s.network.display_name(),
        s.tps.map(|t| format!("{:.1}", t)).unwrap_or_else(|| "-".into()),
        tag(Field::Tps),
        s.gas_price.as_deref().unwrap_or("-"),
        tag(Field::GasPrice),
        s.finality,
        tag(Field::Finality),
        s.uptime,
        tag(Field::Uptime),
        s.market_cap,
        tag(Field::MarketCap),
        s.tvl,
        tag(Field::Tvl),
        s.live_count(),
        Field::ALL.len()
    )
}
