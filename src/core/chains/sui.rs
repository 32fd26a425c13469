use async_trait::async_trait;

use crate::core::metrics;
use crate::core::sources::{ChainSource, GasReading};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::NetworkId;
use crate::providers::sui::Checkpoint;
use crate::providers::SuiClient;
use crate::utils::constants::TPS_BLOCK_WINDOW;

/// Sui over an ordered list of fullnode endpoints.
///
/// TPS comes straight from checkpoint counters with no floor or clamp.
pub struct SuiSource {
    client: SuiClient,
}

impl SuiSource {
    pub fn new(client: SuiClient) -> Self {
        Self { client }
    }

    /// Latest checkpoint and the one `TPS_BLOCK_WINDOW` before it
    async fn checkpoint_window(&self) -> AppResult<(Checkpoint, Checkpoint)> {
        let latest = self.client.latest_checkpoint_sequence().await?;
        let earlier = latest.saturating_sub(TPS_BLOCK_WINDOW);
        if earlier == latest {
            return Err(AppError::missing("Sui chain too short for a checkpoint window"));
        }
        tokio::try_join!(self.client.checkpoint(earlier), self.client.checkpoint(latest))
    }
}

#[async_trait]
impl ChainSource for SuiSource {
    fn network(&self) -> NetworkId {
        NetworkId::Sui
    }

    async fn tps(&self) -> AppResult<f64> {
        let (first, last) = self.checkpoint_window().await?;
        window_tps(&first, &last)
    }

    /// Reference gas price in MIST
    async fn gas_price(&self) -> AppResult<GasReading> {
        Ok(GasReading {
            price_per_unit: self.client.reference_gas_price().await? as f64,
        })
    }

    async fn uptime(&self) -> AppResult<f64> {
        self.client.system_state().await?.staked_share()
    }

    /// Mean checkpoint interval over the window
    async fn finality_secs(&self) -> AppResult<f64> {
        let (first, last) = self.checkpoint_window().await?;
        window_finality(&first, &last)
    }

    async fn tps_and_finality(&self) -> (AppResult<f64>, AppResult<f64>) {
        match self.checkpoint_window().await {
            Ok((first, last)) => (window_tps(&first, &last), window_finality(&first, &last)),
            Err(e) => (Err(e.detached()), Err(e)),
        }
    }
}

fn window_tps(first: &Checkpoint, last: &Checkpoint) -> AppResult<f64> {
    metrics::tps_from_counters(first.counter()?, last.counter()?)
        .ok_or_else(|| AppError::missing("Checkpoint window has no positive elapsed time"))
}

fn window_finality(first: &Checkpoint, last: &Checkpoint) -> AppResult<f64> {
    let (a, b) = (first.counter()?, last.counter()?);
    let checkpoints = last.sequence()?.saturating_sub(first.sequence()?);
    if b.timestamp_ms <= a.timestamp_ms || checkpoints == 0 {
        return Err(AppError::missing("Checkpoint window has no positive elapsed time"));
    }
    Ok((b.timestamp_ms - a.timestamp_ms) as f64 / 1000.0 / checkpoints as f64)
}
