//! RPC Client Module - JSON-RPC over HTTP
//!
//! One provider per network, holding an ordered list of endpoints:
//! 1. Each call tries every endpoint once, in order, and returns the first success
//! 2. No retries or backoff: the next poll cycle is the retry
//! 3. Gzip + User-Agent headers on every request
//! 4. Typed helpers for the EVM methods the aggregator needs

use alloy_primitives::U256;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::build_client;
use crate::models::errors::{AppError, AppResult, ErrorCode};

/// RPC provider with ordered endpoint failover
#[derive(Clone)]
pub struct RpcProvider {
    /// Endpoints tried in order
    endpoints: Vec<String>,
    /// HTTP client with custom headers (gzip enabled)
    client: reqwest::Client,
    /// Network name for logging
    network_name: String,
}

impl RpcProvider {
    /// Create a provider for a list of endpoints
    pub fn new(network_name: impl Into<String>, endpoints: Vec<String>) -> AppResult<Self> {
        let network_name = network_name.into();
        if endpoints.is_empty() {
            return Err(AppError::invalid_config(format!(
                "No RPC endpoints configured for {}",
                network_name
            )));
        }

        Ok(Self {
            endpoints,
            client: build_client()?,
            network_name,
        })
    }

    /// Execute a JSON-RPC call, failing over across endpoints
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let mut last_error = None;
        for url in &self.endpoints {
            match self.execute_call::<T>(url, &payload).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!(
                        "⚠️ {} {} failed on {}: {}",
                        self.network_name,
                        method,
                        mask_url(url),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if self.endpoints.len() == 1 => Err(e),
            Some(e) => Err(AppError::no_endpoints(format!(
                "All {} endpoints failed for {} {} (last: {})",
                self.endpoints.len(),
                self.network_name,
                method,
                e
            ))),
            None => Err(AppError::no_endpoints(format!("No endpoints for {}", self.network_name))),
        }
    }

    /// Execute single RPC call
    async fn execute_call<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> AppResult<T> {
        debug!("📡 {} → {}", payload["method"], mask_url(url));

        let response = self.client.post(url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http_status(status, &mask_url(url)));
        }

        let json: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::invalid_response(format!("Failed to parse RPC response: {}", e)))?;

        if let Some(error) = json.error {
            return Err(error.into());
        }

        json.result
            .ok_or_else(|| AppError::missing("No result in RPC response"))
    }

    // ============================================
    // EVM HELPERS
    // ============================================

    /// Latest block height (eth_blockNumber)
    pub async fn eth_block_number(&self) -> AppResult<u64> {
        let raw: String = self.call("eth_blockNumber", serde_json::json!([])).await?;
        parse_hex_u64(&raw)
    }

    /// Block header with transaction hashes only (eth_getBlockByNumber, false)
    pub async fn eth_get_block(&self, number: u64) -> AppResult<EvmBlock> {
        let params = serde_json::json!([format!("0x{:x}", number), false]);
        let block: Option<EvmBlock> = self.call("eth_getBlockByNumber", params).await?;
        block.ok_or_else(|| AppError::missing(format!("Block {} not found", number)))
    }

    /// Current gas price in wei (eth_gasPrice)
    pub async fn eth_gas_price(&self) -> AppResult<U256> {
        let raw: String = self.call("eth_gasPrice", serde_json::json!([])).await?;
        parse_hex_u256(&raw)
    }
}

/// EVM block as returned with `full_transactions = false`
#[derive(Debug, Clone, Deserialize)]
pub struct EvmBlock {
    pub number: Option<String>,
    pub timestamp: String,
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
}

impl EvmBlock {
    pub fn timestamp_secs(&self) -> AppResult<u64> {
        parse_hex_u64(&self.timestamp)
    }

    pub fn tx_count(&self) -> u64 {
        self.transactions.len() as u64
    }
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Node-side throttling (code -32005 or a "rate limit" message)
    pub fn is_rate_limit(&self) -> bool {
        self.code == -32005 || self.message.to_lowercase().contains("rate limit")
    }
}

impl From<RpcError> for AppError {
    fn from(err: RpcError) -> Self {
        if err.is_rate_limit() {
            AppError::new(
                ErrorCode::UpstreamRateLimited,
                format!("RPC rate limited: {} (code: {})", err.message, err.code),
            )
        } else {
            AppError::rpc(err.code, err.message)
        }
    }
}

/// Parse a 0x-prefixed hex quantity into u64
pub fn parse_hex_u64(raw: &str) -> AppResult<u64> {
    let value = parse_hex_u256(raw)?;
    u64::try_from(value)
        .map_err(|_| AppError::invalid_response(format!("Quantity {} overflows u64", raw)))
}

/// Parse a 0x-prefixed hex quantity into U256
pub fn parse_hex_u256(raw: &str) -> AppResult<U256> {
    let digits = raw
        .trim()
        .strip_prefix("0x")
        .or_else(|| raw.trim().strip_prefix("0X"))
        .ok_or_else(|| AppError::invalid_response(format!("Not a hex quantity: {:?}", raw)))?;
    if digits.is_empty() {
        return Err(AppError::invalid_response("Empty hex quantity"));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| AppError::invalid_response(format!("Bad hex quantity {:?}: {}", raw, e)))
}

/// Convert a U256 amount to f64 (precision loss acceptable for display metrics)
pub fn u256_to_f64(value: U256) -> AppResult<f64> {
    u128::try_from(value)
        .map(|v| v as f64)
        .map_err(|_| AppError::invalid_response("Quantity too large"))
}

/// Hide API keys embedded in node URLs
pub fn mask_url(url: &str) -> String {
    for marker in ["/v2/", "/v3/", "?apikey=", "?api-key="] {
        if let Some(idx) = url.find(marker) {
            return format!("{}{}***HIDDEN***", &url[..idx], marker);
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_hex_parsing() {
        assert_eq!(parse_hex_u64("0x10").unwrap(), 16);
        assert_eq!(parse_hex_u64("0x0").unwrap(), 0);
        assert!(parse_hex_u64("16").is_err());
        assert!(parse_hex_u64("0x").is_err());
        assert!(parse_hex_u64("0xzz").is_err());
        assert_eq!(
            parse_hex_u256("0x4a817c800").unwrap(),
            U256::from(20_000_000_000u64)
        );
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://eth-mainnet.g.alchemy.com/v2/secret"),
            "https://eth-mainnet.g.alchemy.com/v2/***HIDDEN***"
        );
        assert_eq!(mask_url("https://mainnet.base.org"), "https://mainnet.base.org");
    }

    #[tokio::test]
    async fn test_rate_limit_error_object_maps_to_rate_limited() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"Request rate limit exceeded"}}"#)
            .create_async()
            .await;

        let provider = RpcProvider::new("test", vec![server.url()]).unwrap();
        let err = provider.eth_block_number().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UpstreamRateLimited);
        assert!(err.message.contains("-32005"));
    }

    #[test]
    fn test_empty_endpoint_list_rejected() {
        assert!(RpcProvider::new("base", vec![]).is_err());
    }

    #[tokio::test]
    async fn test_failover_to_second_endpoint() {
        let mut down = Server::new_async().await;
        let mut up = Server::new_async().await;

        let _m1 = down.mock("POST", "/").with_status(503).create_async().await;
        let _m2 = up
            .mock("POST", "/")
            .match_body(Matcher::Regex(r#""method"\s*:\s*"eth_blockNumber""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x1b4"}"#)
            .create_async()
            .await;

        let provider = RpcProvider::new("test", vec![down.url(), up.url()]).unwrap();
        assert_eq!(provider.eth_block_number().await.unwrap(), 436);
    }

    #[tokio::test]
    async fn test_rpc_error_object_is_surfaced() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#)
            .create_async()
            .await;

        let provider = RpcProvider::new("test", vec![server.url()]).unwrap();
        let err = provider.eth_gas_price().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RpcError);
    }

    #[tokio::test]
    async fn test_null_block_is_missing_value() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
            .create_async()
            .await;

        let provider = RpcProvider::new("test", vec![server.url()]).unwrap();
        let err = provider.eth_get_block(5).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingValue);
    }
}
