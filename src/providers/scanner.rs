//! Etherscan-family scanner client
//!
//! Covers Ethereum, Polygon and BSC through the Etherscan V2 multichain API:
//! - `gastracker/gasoracle` for the proposed gas price (gwei)
//! - `proxy/eth_blockNumber`, `proxy/eth_getBlockByNumber` for the TPS window
//!
//! The key is optional; without one the API answers with a low rate limit
//! or a NOTOK status, which surfaces as an estimated field.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, parse_decimal, send_json};
use super::rpc::{parse_hex_u64, EvmBlock};
use crate::models::errors::{AppError, AppResult};

/// Gas oracle payload (values are decimal strings, in gwei)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GasOracle {
    pub safe_gas_price: Option<String>,
    pub propose_gas_price: Option<String>,
    pub fast_gas_price: Option<String>,
}

/// Scanner client for one chain
#[derive(Clone)]
pub struct ScannerClient {
    client: reqwest::Client,
    base_url: String,
    chain_id: u64,
    api_key: Option<String>,
    label: String,
}

impl ScannerClient {
    pub fn new(
        label: impl Into<String>,
        base_url: impl Into<String>,
        chain_id: u64,
        api_key: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into(),
            chain_id,
            api_key,
            label: label.into(),
        })
    }

    /// Raw call returning the decoded `result` member
    async fn call<T: DeserializeOwned>(
        &self,
        module: &str,
        action: &str,
        extra: &[(&str, String)],
    ) -> AppResult<T> {
        let mut query: Vec<(&str, String)> = vec![
            ("chainid", self.chain_id.to_string()),
            ("module", module.to_string()),
            ("action", action.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.clone()));
        }
        query.extend(extra.iter().cloned());

        debug!("🔍 {} scanner {}.{}", self.label, module, action);

        let request = self.client.get(&self.base_url).query(&query);
        let body: serde_json::Value =
            send_json(request, &format!("{} scanner", self.label)).await?;

        // Proxy calls answer in JSON-RPC shape, the rest in status/message/result
        if let Some(error) = body.get("error") {
            let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
            let message = error.get("message").and_then(|m| m.as_str()).unwrap_or("unknown");
            return Err(AppError::rpc(code, message));
        }
        if body.get("status").and_then(|s| s.as_str()) == Some("0") {
            let detail = body
                .get("result")
                .and_then(|r| r.as_str())
                .or_else(|| body.get("message").and_then(|m| m.as_str()))
                .unwrap_or("NOTOK");
            return Err(AppError::invalid_response(format!(
                "{} scanner {}.{} rejected: {}",
                self.label, module, action, detail
            )));
        }

        let result = body
            .get("result")
            .cloned()
            .filter(|r| !r.is_null())
            .ok_or_else(|| AppError::missing(format!("{} scanner returned no result", self.label)))?;

        serde_json::from_value(result).map_err(|e| {
            AppError::invalid_response(format!("{} scanner {}.{}: {}", self.label, module, action, e))
        })
    }

    pub async fn gas_oracle(&self) -> AppResult<GasOracle> {
        self.call("gastracker", "gasoracle", &[]).await
    }

    /// Proposed gas price in gwei
    pub async fn proposed_gas_gwei(&self) -> AppResult<f64> {
        let oracle = self.gas_oracle().await?;
        let raw = oracle
            .propose_gas_price
            .ok_or_else(|| AppError::missing("ProposeGasPrice missing from gas oracle"))?;
        parse_decimal(&raw, "ProposeGasPrice")
    }

    pub async fn block_number(&self) -> AppResult<u64> {
        let raw: String = self.call("proxy", "eth_blockNumber", &[]).await?;
        parse_hex_u64(&raw)
    }

    pub async fn block(&self, number: u64) -> AppResult<EvmBlock> {
        self.call(
            "proxy",
            "eth_getBlockByNumber",
            &[("tag", format!("0x{:x}", number)), ("boolean", "false".to_string())],
        )
        .await
    }
}
