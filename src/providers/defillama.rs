//! DefiLlama TVL client
//!
//! `GET /v2/chains` returns every chain with its current TVL; the entry is
//! matched by display name, case-insensitively.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, send_json};
use crate::core::sources::TvlSource;
use crate::models::errors::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct ChainTvl {
    pub name: String,
    pub tvl: Option<f64>,
}

pub struct DefiLlamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl DefiLlamaClient {
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into(),
        })
    }

    pub async fn chains(&self) -> AppResult<Vec<ChainTvl>> {
        let url = format!("{}/v2/chains", self.base_url);
        send_json(self.client.get(&url), "defillama").await
    }
}

#[async_trait]
impl TvlSource for DefiLlamaClient {
    async fn chain_tvl(&self, chain_name: &str) -> AppResult<f64> {
        let chains = self.chains().await?;
        debug!("🦙 DefiLlama: {} chains listed", chains.len());

        chains
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(chain_name))
            .and_then(|c| c.tvl)
            .ok_or_else(|| AppError::missing(format!("DefiLlama has no TVL for {}", chain_name)))
    }
}
