use async_trait::async_trait;

use super::{sample_recent_blocks, window_tps};
use crate::core::metrics::{self, BlockSample};
use crate::core::sources::{ChainSource, GasReading};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::NetworkId;
use crate::providers::rpc::u256_to_f64;
use crate::providers::{CosmosRestClient, RpcProvider};
use crate::utils::constants::TPS_BLOCK_WINDOW;

/// Sei: Cosmos REST for blocks and validators, EVM RPC for gas.
///
/// TPS is reported as measured, with no floor or clamp.
pub struct SeiSource {
    rest: CosmosRestClient,
    evm: RpcProvider,
}

impl SeiSource {
    pub fn new(rest: CosmosRestClient, evm: RpcProvider) -> Self {
        Self { rest, evm }
    }

    /// The last `TPS_BLOCK_WINDOW` blocks
    async fn block_window(&self) -> AppResult<Vec<BlockSample>> {
        let latest = self.rest.latest_block().await?.height()?;
        sample_recent_blocks(latest, TPS_BLOCK_WINDOW, |height| async move {
            self.rest.block(height).await?.sample()
        })
        .await
    }
}

#[async_trait]
impl ChainSource for SeiSource {
    fn network(&self) -> NetworkId {
        NetworkId::Sei
    }

    async fn tps(&self) -> AppResult<f64> {
        window_tps(&self.block_window().await?)
    }

    async fn gas_price(&self) -> AppResult<GasReading> {
        let wei = self.evm.eth_gas_price().await?;
        Ok(GasReading {
            price_per_unit: u256_to_f64(wei)?,
        })
    }

    async fn uptime(&self) -> AppResult<f64> {
        self.rest.latest_validator_set().await?.active_share()
    }

    /// Mean block interval over the window
    async fn finality_secs(&self) -> AppResult<f64> {
        window_finality(&self.block_window().await?)
    }

    async fn tps_and_finality(&self) -> (AppResult<f64>, AppResult<f64>) {
        match self.block_window().await {
            Ok(samples) => (window_tps(&samples), window_finality(&samples)),
            Err(e) => (Err(e.detached()), Err(e)),
        }
    }
}

fn window_finality(samples: &[BlockSample]) -> AppResult<f64> {
    metrics::mean_block_interval(samples)
        .ok_or_else(|| AppError::missing("Block window has no positive elapsed time"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn block(height: u64, time: &str) -> String {
        format!(
            r#"{{"block":{{"header":{{"height":"{}","time":"{}"}},"data":{{"txs":["a","b"]}}}}}}"#,
            height, time
        )
    }

    /// Blocks 1001..=1010, 0.4s apart, two txs each
    async fn mock_window(server: &mut mockito::ServerGuard) -> Vec<mockito::Mock> {
        let mut mocks = vec![
            server
                .mock("GET", "/cosmos/base/tendermint/v1beta1/blocks/latest")
                .with_status(200)
                .with_body(block(1_010, "2024-05-01T12:00:03.6Z"))
                .expect(1)
                .create_async()
                .await,
        ];
        for height in 1_001u64..=1_010 {
            let millis = (height - 1_001) * 400;
            let time = format!("2024-05-01T12:00:{:02}.{:03}Z", millis / 1000, millis % 1000);
            mocks.push(
                server
                    .mock("GET", format!("/cosmos/base/tendermint/v1beta1/blocks/{}", height).as_str())
                    .with_status(200)
                    .with_body(block(height, &time))
                    .expect(1)
                    .create_async()
                    .await,
            );
        }
        mocks
    }

    fn source(server: &mockito::ServerGuard) -> SeiSource {
        SeiSource::new(
            CosmosRestClient::new(server.url()).unwrap(),
            RpcProvider::new("Sei EVM", vec![server.url()]).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_tps_and_finality_from_one_window() {
        let mut server = Server::new_async().await;
        let mocks = mock_window(&mut server).await;

        let (tps, finality) = source(&server).tps_and_finality().await;
        // 20 txs over 3.6s
        assert_eq!(tps.unwrap(), 5.6);
        assert!((finality.unwrap() - 0.4).abs() < 1e-9);

        for mock in &mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_uptime_from_validator_set() {
        let mut server = Server::new_async().await;
        let _vals = server
            .mock("GET", "/cosmos/base/tendermint/v1beta1/validatorsets/latest")
            .with_status(200)
            .with_body(r#"{"validators":[{"address":"a","voting_power":"10"},{"address":"b","voting_power":"10"}]}"#)
            .create_async()
            .await;

        assert_eq!(source(&server).uptime().await.unwrap(), 100.0);
    }
}
