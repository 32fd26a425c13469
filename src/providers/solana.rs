//! Solana Provider Module
//!
//! Standard JSON-RPC over the shared `RpcProvider`:
//! - getRecentPerformanceSamples - throughput per sample window
//! - getRecentPrioritizationFees - recent priority fees (micro-lamports per CU)

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::rpc::RpcProvider;
use crate::core::metrics::PerfSample;
use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{SOLANA_BASE_FEE_LAMPORTS, SOLANA_COMPUTE_UNITS};

// ============================================
// SOLANA RPC TYPES
// ============================================

/// Entry of getRecentPerformanceSamples
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    pub slot: u64,
    pub num_transactions: u64,
    pub num_slots: u64,
    pub sample_period_secs: u64,
    #[serde(default)]
    pub num_non_vote_transactions: Option<u64>,
}

impl From<&PerformanceSample> for PerfSample {
    fn from(s: &PerformanceSample) -> Self {
        PerfSample {
            num_transactions: s.num_transactions,
            sample_period_secs: s.sample_period_secs,
        }
    }
}

/// Entry of getRecentPrioritizationFees
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationFee {
    pub slot: u64,
    /// Micro-lamports per compute unit
    pub prioritization_fee: u64,
}

// ============================================
// SOLANA CLIENT
// ============================================

pub struct SolanaClient {
    rpc: RpcProvider,
}

impl SolanaClient {
    pub fn new(endpoints: Vec<String>) -> AppResult<Self> {
        Ok(Self {
            rpc: RpcProvider::new("Solana", endpoints)?,
        })
    }

    pub async fn recent_performance_samples(&self, limit: usize) -> AppResult<Vec<PerformanceSample>> {
        let samples: Vec<PerformanceSample> = self
            .rpc
            .call("getRecentPerformanceSamples", json!([limit]))
            .await?;
        debug!("☀️ Solana: {} performance samples", samples.len());

        if samples.is_empty() {
            return Err(AppError::missing("No Solana performance samples"));
        }
        Ok(samples)
    }

    pub async fn recent_prioritization_fees(&self) -> AppResult<Vec<PrioritizationFee>> {
        self.rpc.call("getRecentPrioritizationFees", json!([])).await
    }

    /// Lamports for a typical transaction: base signature fee plus the mean
    /// recent priority fee over a standard compute budget
    pub async fn typical_fee_lamports(&self) -> AppResult<f64> {
        let fees = self.recent_prioritization_fees().await?;
        Ok(fee_lamports(&fees))
    }
}

/// Base fee plus mean priority fee, where priority fees are micro-lamports per CU
pub fn fee_lamports(fees: &[PrioritizationFee]) -> f64 {
    if fees.is_empty() {
        return SOLANA_BASE_FEE_LAMPORTS;
    }
    let mean = fees.iter().map(|f| f.prioritization_fee as f64).sum::<f64>() / fees.len() as f64;
    SOLANA_BASE_FEE_LAMPORTS + mean * SOLANA_COMPUTE_UNITS / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_fee_lamports() {
        assert_eq!(fee_lamports(&[]), 5_000.0);

        let fees = [
            PrioritizationFee {
                slot: 1,
                prioritization_fee: 0,
            },
            PrioritizationFee {
                slot: 2,
                prioritization_fee: 20_000,
            },
        ];
        // mean 10_000 micro-lamports/CU * 200_000 CU = 2_000 lamports
        assert_eq!(fee_lamports(&fees), 7_000.0);
    }

    #[tokio::test]
    async fn test_performance_samples() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "getRecentPerformanceSamples"})))
            .with_status(200)
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"result":[
                    {"slot":300,"numTransactions":126000,"numSlots":150,"samplePeriodSecs":60,"numNonVoteTransactions":30000},
                    {"slot":150,"numTransactions":114000,"numSlots":150,"samplePeriodSecs":60}
                ]}"#,
            )
            .create_async()
            .await;

        let client = SolanaClient::new(vec![server.url()]).unwrap();
        let samples = client.recent_performance_samples(2).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].num_non_vote_transactions, None);

        let perf: Vec<PerfSample> = samples.iter().map(PerfSample::from).collect();
        assert_eq!(crate::core::metrics::tps_from_samples(&perf), Some(2000.0));
    }

    #[tokio::test]
    async fn test_empty_samples_are_missing() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":[]}"#)
            .create_async()
            .await;

        let client = SolanaClient::new(vec![server.url()]).unwrap();
        assert!(client.recent_performance_samples(10).await.is_err());
    }
}
