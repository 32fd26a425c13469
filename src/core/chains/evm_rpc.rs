use async_trait::async_trait;

use super::{evm_sample, sample_recent_blocks, window_tps};
use crate::core::sources::{ChainSource, GasReading};
use crate::models::errors::AppResult;
use crate::models::types::NetworkId;
use crate::providers::rpc::u256_to_f64;
use crate::providers::RpcProvider;
use crate::utils::constants::TPS_BLOCK_WINDOW;

/// Any EVM chain reachable over plain JSON-RPC (Base, self-hosted Ethereum)
pub struct EvmRpcSource {
    network: NetworkId,
    rpc: RpcProvider,
}

impl EvmRpcSource {
    pub fn new(network: NetworkId, rpc: RpcProvider) -> Self {
        Self { network, rpc }
    }
}

#[async_trait]
impl ChainSource for EvmRpcSource {
    fn network(&self) -> NetworkId {
        self.network
    }

    async fn tps(&self) -> AppResult<f64> {
        let latest = self.rpc.eth_block_number().await?;
        let samples = sample_recent_blocks(latest, TPS_BLOCK_WINDOW, |height| async move {
            let block = self.rpc.eth_get_block(height).await?;
            evm_sample(height, &block)
        })
        .await?;
        window_tps(&samples)
    }

    async fn gas_price(&self) -> AppResult<GasReading> {
        let wei = self.rpc.eth_gas_price().await?;
        Ok(GasReading {
            price_per_unit: u256_to_f64(wei)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_gas_price_in_wei() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_gasPrice"})))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x3b9aca00"}"#)
            .create_async()
            .await;

        let rpc = RpcProvider::new("Base", vec![server.url()]).unwrap();
        let source = EvmRpcSource::new(NetworkId::Base, rpc);
        assert_eq!(source.gas_price().await.unwrap().price_per_unit, 1e9);
    }

    #[tokio::test]
    async fn test_identical_timestamps_yield_error() {
        let mut server = Server::new_async().await;
        let _n = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_blockNumber"})))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0xa"}"#)
            .create_async()
            .await;
        let _b = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_getBlockByNumber"})))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"number":"0xa","timestamp":"0x6553f100","transactions":["0x1"]}}"#)
            .create_async()
            .await;

        let rpc = RpcProvider::new("Base", vec![server.url()]).unwrap();
        let source = EvmRpcSource::new(NetworkId::Base, rpc);
        assert!(source.tps().await.is_err());
    }
}
