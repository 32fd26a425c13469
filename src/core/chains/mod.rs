//! Per-network chain sources
//!
//! | Network            | TPS                      | Gas                    | Uptime / finality     |
//! |--------------------|--------------------------|------------------------|-----------------------|
//! | Ethereum/Polygon/BSC | scanner proxy blocks   | scanner gas oracle     | -                     |
//! | Ethereum (ETH_HTTP_URL), Base | JSON-RPC blocks | eth_gasPrice          | -                     |
//! | Solana             | performance samples      | priority fees          | -                     |
//! | Sui                | checkpoint counters      | reference gas price    | staking pools, checkpoints |
//! | Sei                | Cosmos REST blocks       | EVM eth_gasPrice       | validator set, blocks |

pub mod evm_rpc;
pub mod evm_scanner;
pub mod sei;
pub mod solana;
pub mod sui;

use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::metrics::{self, BlockSample};
use crate::core::sources::ChainSource;
use crate::models::config::AggregatorConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::NetworkId;
use crate::providers::rpc::EvmBlock;
use crate::providers::{CosmosRestClient, RpcProvider, ScannerClient, SolanaClient, SuiClient};
use crate::utils::constants::{CHAIN_ID_BSC, CHAIN_ID_ETHEREUM, CHAIN_ID_POLYGON};

pub use evm_rpc::EvmRpcSource;
pub use evm_scanner::ScannerSource;
pub use sei::SeiSource;
pub use solana::SolanaSource;
pub use sui::SuiSource;

/// Load the `depth` blocks ending at `latest`, concurrently.
///
/// The window is all or nothing: a rate over a window with holes in it
/// undercounts, so any failed block fails the whole sample.
pub async fn sample_recent_blocks<F, Fut>(latest: u64, depth: u64, fetch: F) -> AppResult<Vec<BlockSample>>
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = AppResult<BlockSample>>,
{
    let first = latest.saturating_sub(depth.saturating_sub(1));
    let results = join_all((first..=latest).map(&fetch)).await;

    let requested = results.len();
    let mut samples = Vec::with_capacity(requested);
    let mut failed = 0;
    let mut first_error = None;
    for result in results {
        match result {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                debug!("Block fetch failed: {}", e);
                failed += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(e) = first_error {
        return Err(AppError::new(
            e.code,
            format!("{} of {} blocks failed to load ({})", failed, requested, e.message),
        ));
    }
    if samples.len() < 2 {
        return Err(AppError::missing(format!("Only {} block in window", samples.len())));
    }
    Ok(samples)
}

/// TPS over a block window, or an error when the window has no usable span
pub fn window_tps(samples: &[BlockSample]) -> AppResult<f64> {
    metrics::tps_from_blocks(samples)
        .ok_or_else(|| AppError::missing("Block window has no positive elapsed time"))
}

/// Block sample from an EVM header
pub fn evm_sample(height: u64, block: &EvmBlock) -> AppResult<BlockSample> {
    Ok(BlockSample {
        height,
        timestamp: block.timestamp_secs()? as f64,
        tx_count: block.tx_count(),
    })
}

/// Build the chain source for a network from configuration
pub fn build_chain_source(network: NetworkId, config: &AggregatorConfig) -> AppResult<Arc<dyn ChainSource>> {
    let endpoints = &config.endpoints;
    let scanner = |chain_id: u64| {
        ScannerClient::new(
            network.as_str(),
            endpoints.scanner_url.clone(),
            chain_id,
            config.api_keys.scanner_key(network),
        )
    };

    let source: Arc<dyn ChainSource> = match network {
        NetworkId::Ethereum => match &endpoints.ethereum_rpc {
            Some(url) => {
                info!("🔗 Ethereum via JSON-RPC {}", crate::providers::mask_url(url));
                Arc::new(EvmRpcSource::new(network, RpcProvider::new("Ethereum", vec![url.clone()])?))
            }
            None => Arc::new(ScannerSource::new(network, scanner(CHAIN_ID_ETHEREUM)?)),
        },
        NetworkId::Polygon => Arc::new(ScannerSource::new(network, scanner(CHAIN_ID_POLYGON)?)),
        NetworkId::Bsc => Arc::new(ScannerSource::new(network, scanner(CHAIN_ID_BSC)?)),
        NetworkId::Base => Arc::new(EvmRpcSource::new(
            network,
            RpcProvider::new("Base", endpoints.base_rpc.clone())?,
        )),
        NetworkId::Solana => Arc::new(SolanaSource::new(SolanaClient::new(endpoints.solana_rpc.clone())?)),
        NetworkId::Sui => Arc::new(SuiSource::new(SuiClient::new(endpoints.sui_rpc.clone())?)),
        NetworkId::Sei => Arc::new(SeiSource::new(
            CosmosRestClient::new(endpoints.sei_rest.clone())?,
            RpcProvider::new("Sei EVM", endpoints.sei_evm_rpc.clone())?,
        )),
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    fn spaced(height: u64) -> BlockSample {
        BlockSample {
            height,
            timestamp: height as f64 * 2.0,
            tx_count: 4,
        }
    }

    #[tokio::test]
    async fn test_full_window_rate() {
        let samples = sample_recent_blocks(109, 10, |height| async move { Ok(spaced(height)) })
            .await
            .unwrap();

        assert_eq!(samples.len(), 10);
        assert_eq!(samples.first().map(|s| s.height), Some(100));
        // 40 txs over 18s
        assert_eq!(window_tps(&samples).unwrap(), 2.2);
    }

    #[tokio::test]
    async fn test_window_with_holes_is_rejected() {
        let err = sample_recent_blocks(109, 10, |height| async move {
            if [100, 104, 109].contains(&height) {
                Ok(spaced(height))
            } else {
                Err(AppError::new(ErrorCode::UpstreamRateLimited, "HTTP 429"))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::UpstreamRateLimited);
        assert!(err.message.starts_with("7 of 10 blocks failed"));
    }

    #[tokio::test]
    async fn test_single_missing_block_fails_window() {
        let result = sample_recent_blocks(109, 10, |height| async move {
            if height == 105 {
                Err(AppError::missing("gone"))
            } else {
                Ok(spaced(height))
            }
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_genesis_window_needs_two_blocks() {
        let result = sample_recent_blocks(0, 10, |height| async move { Ok(spaced(height)) }).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_build_every_default_source() {
        let config = AggregatorConfig::default();
        for network in NetworkId::ALL {
            let source = build_chain_source(network, &config).unwrap();
            assert_eq!(source.network(), network);
        }
    }
}
