//! Cosmos SDK REST (LCD) client, used for Sei
//!
//! - /cosmos/base/tendermint/v1beta1/blocks/{height|latest}
//! - /cosmos/base/tendermint/v1beta1/validatorsets/latest

use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, parse_decimal, send_json};
use crate::core::metrics::BlockSample;
use crate::models::errors::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct BlockResponse {
    pub block: CosmosBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CosmosBlock {
    pub header: BlockHeader,
    pub data: BlockData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub height: String,
    /// RFC 3339 with nanoseconds
    pub time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockData {
    #[serde(default)]
    pub txs: Option<Vec<String>>,
}

impl CosmosBlock {
    pub fn height(&self) -> AppResult<u64> {
        self.header
            .height
            .parse()
            .map_err(|_| AppError::invalid_response(format!("Bad block height {:?}", self.header.height)))
    }

    pub fn sample(&self) -> AppResult<BlockSample> {
        let time = DateTime::parse_from_rfc3339(&self.header.time)
            .map_err(|e| AppError::invalid_response(format!("Bad block time {:?}: {}", self.header.time, e)))?;
        let timestamp = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9;

        Ok(BlockSample {
            height: self.height()?,
            timestamp,
            tx_count: self.data.txs.as_ref().map_or(0, |t| t.len() as u64),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorSetResponse {
    #[serde(default)]
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Validator {
    pub address: String,
    pub voting_power: String,
}

impl ValidatorSetResponse {
    /// Percentage of the set holding non-zero voting power
    pub fn active_share(&self) -> AppResult<f64> {
        if self.validators.is_empty() {
            return Err(AppError::missing("Validator set is empty"));
        }
        let mut active = 0usize;
        for validator in &self.validators {
            if parse_decimal(&validator.voting_power, "voting_power")? > 0.0 {
                active += 1;
            }
        }
        Ok(active as f64 / self.validators.len() as f64 * 100.0)
    }
}

pub struct CosmosRestClient {
    client: reqwest::Client,
    base_url: String,
}

impl CosmosRestClient {
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into(),
        })
    }

    pub async fn latest_block(&self) -> AppResult<CosmosBlock> {
        self.get_block("latest").await
    }

    pub async fn block(&self, height: u64) -> AppResult<CosmosBlock> {
        self.get_block(&height.to_string()).await
    }

    async fn get_block(&self, which: &str) -> AppResult<CosmosBlock> {
        let url = format!("{}/cosmos/base/tendermint/v1beta1/blocks/{}", self.base_url, which);
        debug!("🧱 Cosmos REST: block {}", which);
        let body: BlockResponse = send_json(self.client.get(&url), "cosmos-rest").await?;
        Ok(body.block)
    }

    pub async fn latest_validator_set(&self) -> AppResult<ValidatorSetResponse> {
        let url = format!("{}/cosmos/base/tendermint/v1beta1/validatorsets/latest", self.base_url);
        send_json(self.client.get(&url), "cosmos-rest").await
    }
}
