//! Sui JSON-RPC client
//!
//! Checkpoints carry a cumulative `networkTotalTransactions` counter and a
//! millisecond timestamp, so TPS and checkpoint cadence come from two reads.
//! Sui encodes u64 values as JSON strings.

use serde::Deserialize;
use serde_json::json;

use super::http::parse_decimal;
use super::rpc::RpcProvider;
use crate::core::metrics::CounterSample;
use crate::models::errors::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub sequence_number: String,
    pub timestamp_ms: String,
    pub network_total_transactions: String,
}

impl Checkpoint {
    pub fn sequence(&self) -> AppResult<u64> {
        parse_u64(&self.sequence_number, "sequenceNumber")
    }

    pub fn counter(&self) -> AppResult<CounterSample> {
        Ok(CounterSample {
            total_transactions: parse_u64(&self.network_total_transactions, "networkTotalTransactions")?,
            timestamp_ms: parse_u64(&self.timestamp_ms, "timestampMs")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiSystemState {
    #[serde(default)]
    pub active_validators: Vec<SuiValidator>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiValidator {
    #[serde(default)]
    pub name: Option<String>,
    pub staking_pool_sui_balance: String,
}

impl SuiSystemState {
    /// Percentage of active validators whose staking pool holds SUI
    pub fn staked_share(&self) -> AppResult<f64> {
        if self.active_validators.is_empty() {
            return Err(AppError::missing("Sui system state lists no active validators"));
        }
        let mut staked = 0usize;
        for validator in &self.active_validators {
            if parse_decimal(&validator.staking_pool_sui_balance, "stakingPoolSuiBalance")? > 0.0 {
                staked += 1;
            }
        }
        Ok(staked as f64 / self.active_validators.len() as f64 * 100.0)
    }
}

pub struct SuiClient {
    rpc: RpcProvider,
}

impl SuiClient {
    pub fn new(endpoints: Vec<String>) -> AppResult<Self> {
        Ok(Self {
            rpc: RpcProvider::new("Sui", endpoints)?,
        })
    }

    pub async fn latest_checkpoint_sequence(&self) -> AppResult<u64> {
        let raw: String = self
            .rpc
            .call("sui_getLatestCheckpointSequenceNumber", json!([]))
            .await?;
        parse_u64(&raw, "checkpoint sequence")
    }

    pub async fn checkpoint(&self, sequence: u64) -> AppResult<Checkpoint> {
        self.rpc
            .call("sui_getCheckpoint", json!([sequence.to_string()]))
            .await
    }

    /// Reference gas price in MIST
    pub async fn reference_gas_price(&self) -> AppResult<u64> {
        let raw: String = self.rpc.call("suix_getReferenceGasPrice", json!([])).await?;
        parse_u64(&raw, "reference gas price")
    }

    pub async fn system_state(&self) -> AppResult<SuiSystemState> {
        self.rpc.call("suix_getLatestSuiSystemState", json!([])).await
    }
}

fn parse_u64(raw: &str, what: &str) -> AppResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| AppError::invalid_response(format!("Sui {} is not an integer: {:?}", what, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_staked_share() {
        let state: SuiSystemState = serde_json::from_value(json!({
            "activeValidators": [
                {"name": "a", "stakingPoolSuiBalance": "1000"},
                {"name": "b", "stakingPoolSuiBalance": "0"},
                {"name": "c", "stakingPoolSuiBalance": "5"},
                {"name": "d", "stakingPoolSuiBalance": "7"}
            ]
        }))
        .unwrap();
        assert_eq!(state.staked_share().unwrap(), 75.0);

        let empty = SuiSystemState {
            active_validators: vec![],
        };
        assert!(empty.staked_share().is_err());
    }

    #[tokio::test]
    async fn test_second_endpoint_serves_checkpoint() {
        let mut down = Server::new_async().await;
        let _d = down
            .mock("POST", "/")
            .with_status(503)
            .create_async()
            .await;

        let mut up = Server::new_async().await;
        let _u = up
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "sui_getCheckpoint"})))
            .with_status(200)
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"result":{"sequenceNumber":"100","timestampMs":"1700000000000","networkTotalTransactions":"2500000000","digest":"x"}}"#,
            )
            .create_async()
            .await;

        let client = SuiClient::new(vec![down.url(), up.url()]).unwrap();
        let checkpoint = client.checkpoint(100).await.unwrap();
        assert_eq!(checkpoint.sequence().unwrap(), 100);
        assert_eq!(checkpoint.counter().unwrap().total_transactions, 2_500_000_000);
    }

    #[tokio::test]
    async fn test_reference_gas_price() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"750"}"#)
            .create_async()
            .await;

        let client = SuiClient::new(vec![server.url()]).unwrap();
        assert_eq!(client.reference_gas_price().await.unwrap(), 750);
    }
}
