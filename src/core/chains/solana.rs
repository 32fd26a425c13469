use async_trait::async_trait;

use crate::core::metrics::{self, PerfSample};
use crate::core::sources::{ChainSource, GasReading};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::NetworkId;
use crate::providers::SolanaClient;
use crate::utils::constants::SOLANA_PERF_SAMPLES;

pub struct SolanaSource {
    client: SolanaClient,
}

impl SolanaSource {
    pub fn new(client: SolanaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChainSource for SolanaSource {
    fn network(&self) -> NetworkId {
        NetworkId::Solana
    }

    async fn tps(&self) -> AppResult<f64> {
        let samples = self.client.recent_performance_samples(SOLANA_PERF_SAMPLES).await?;
        let perf: Vec<PerfSample> = samples.iter().map(PerfSample::from).collect();
        metrics::tps_from_samples(&perf)
            .ok_or_else(|| AppError::missing("Performance samples cover no time"))
    }

    /// Lamports per typical transaction (gas units per tx is 1 for Solana)
    async fn gas_price(&self) -> AppResult<GasReading> {
        Ok(GasReading {
            price_per_unit: self.client.typical_fee_lamports().await?,
        })
    }
}
