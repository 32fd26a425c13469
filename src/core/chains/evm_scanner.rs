use async_trait::async_trait;

use super::{evm_sample, sample_recent_blocks, window_tps};
use crate::core::sources::{ChainSource, GasReading};
use crate::models::errors::AppResult;
use crate::models::types::NetworkId;
use crate::providers::ScannerClient;
use crate::utils::constants::TPS_BLOCK_WINDOW;

const WEI_PER_GWEI: f64 = 1e9;

/// Ethereum, Polygon and BSC through the Etherscan-family scanner
pub struct ScannerSource {
    network: NetworkId,
    scanner: ScannerClient,
}

impl ScannerSource {
    pub fn new(network: NetworkId, scanner: ScannerClient) -> Self {
        Self { network, scanner }
    }
}

#[async_trait]
impl ChainSource for ScannerSource {
    fn network(&self) -> NetworkId {
        self.network
    }

    async fn tps(&self) -> AppResult<f64> {
        let latest = self.scanner.block_number().await?;
        let samples = sample_recent_blocks(latest, TPS_BLOCK_WINDOW, |height| async move {
            let block = self.scanner.block(height).await?;
            evm_sample(height, &block)
        })
        .await?;
        window_tps(&samples)
    }

    async fn gas_price(&self) -> AppResult<GasReading> {
        let gwei = self.scanner.proposed_gas_gwei().await?;
        Ok(GasReading {
            price_per_unit: gwei * WEI_PER_GWEI,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fetcher::SnapshotFetcher;
    use crate::core::sources::MarketChain;
    use crate::models::config::FallbackProfile;
    use crate::models::types::{DataQuality, Field};
    use crate::providers::DefiLlamaClient;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use std::sync::Arc;
    use std::time::Duration;

    fn block_body(timestamp: u64, txs: usize) -> String {
        let hashes: Vec<String> = (0..txs).map(|i| format!("\"0x{:x}\"", i)).collect();
        format!(
            r#"{{"jsonrpc":"2.0","id":1,"result":{{"number":"0x1","timestamp":"0x{:x}","transactions":[{}]}}}}"#,
            timestamp,
            hashes.join(",")
        )
    }

    /// Latest block 0x6d and heights 100..=109, 12s apart, 30 txs each.
    /// A height in `rate_limited` answers 429 instead.
    async fn mock_window(server: &mut ServerGuard, rate_limited: Option<u64>) -> Vec<Mock> {
        let mut mocks = vec![
            server
                .mock("GET", "/")
                .match_query(Matcher::UrlEncoded("action".into(), "eth_blockNumber".into()))
                .with_status(200)
                .with_body(r#"{"jsonrpc":"2.0","id":83,"result":"0x6d"}"#)
                .create_async()
                .await,
        ];
        for height in 100u64..=109 {
            let timestamp = 1_700_000_000 + (height - 100) * 12;
            let mock = server.mock("GET", "/").match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("action".into(), "eth_getBlockByNumber".into()),
                Matcher::UrlEncoded("tag".into(), format!("0x{:x}", height)),
            ]));
            let mock = if rate_limited == Some(height) {
                mock.with_status(429).with_body("Too Many Requests")
            } else {
                mock.with_status(200).with_body(block_body(timestamp, 30))
            };
            mocks.push(mock.create_async().await);
        }
        mocks
    }

    fn ethereum(server: &ServerGuard) -> ScannerSource {
        let scanner = ScannerClient::new("ethereum", server.url(), 1, None).unwrap();
        ScannerSource::new(NetworkId::Ethereum, scanner)
    }

    #[tokio::test]
    async fn test_tps_over_scanner_window() {
        let mut server = Server::new_async().await;
        let _mocks = mock_window(&mut server, None).await;

        // 300 txs over 108s
        assert_eq!(ethereum(&server).tps().await.unwrap(), 2.8);
    }

    #[tokio::test]
    async fn test_one_rate_limited_block_leaves_tps_estimated() {
        let mut server = Server::new_async().await;
        let _mocks = mock_window(&mut server, Some(0x67)).await;

        let err = ethereum(&server).tps().await.unwrap_err();
        assert!(err.message.starts_with("1 of 10 blocks failed"));

        // Gas oracle and TVL are unmocked here, so only the window matters
        let fetcher = SnapshotFetcher::new(
            Arc::new(ethereum(&server)),
            Arc::new(MarketChain::new(vec![])),
            Arc::new(DefiLlamaClient::new(server.url()).unwrap()),
            Duration::from_secs(10),
        );
        let snapshot = fetcher.fetch().await;

        let fallback = FallbackProfile::for_network(NetworkId::Ethereum);
        assert_eq!(snapshot.quality(Field::Tps), Some(DataQuality::Estimated));
        assert_eq!(snapshot.tps, Some(fallback.tps));
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_gas_is_converted_to_wei() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("action".into(), "gasoracle".into()))
            .with_status(200)
            .with_body(r#"{"status":"1","message":"OK","result":{"SafeGasPrice":"1","ProposeGasPrice":"3","FastGasPrice":"5"}}"#)
            .create_async()
            .await;

        let scanner = ScannerClient::new("bsc", server.url(), 56, None).unwrap();
        let source = ScannerSource::new(NetworkId::Bsc, scanner);
        assert_eq!(source.gas_price().await.unwrap().price_per_unit, 3e9);
    }
}
