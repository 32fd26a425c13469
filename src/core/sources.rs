//! Upstream seams used by the snapshot fetcher
//!
//! Each trait is one family of upstream calls. Providers implement them
//! against real APIs; tests implement them with canned or delayed values.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::NetworkId;
use crate::utils::constants::CoinRef;

/// Gas price in the chain's smallest native unit, per gas unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasReading {
    pub price_per_unit: f64,
}

/// Per-chain metrics read from the chain itself (RPC, scanner, explorer)
#[async_trait]
pub trait ChainSource: Send + Sync {
    fn network(&self) -> NetworkId;

    /// Transactions per second over the recent window
    async fn tps(&self) -> AppResult<f64>;

    /// Current gas price in the chain's smallest unit
    async fn gas_price(&self) -> AppResult<GasReading>;

    /// Validator-availability percentage, where the chain exposes one
    async fn uptime(&self) -> AppResult<f64> {
        Err(AppError::unsupported("uptime"))
    }

    /// Observed finality in seconds, where it can be measured
    async fn finality_secs(&self) -> AppResult<f64> {
        Err(AppError::unsupported("finality"))
    }

    /// TPS and finality for one fetch. Sources that derive both from the
    /// same block window override this to load the window once.
    async fn tps_and_finality(&self) -> (AppResult<f64>, AppResult<f64>) {
        tokio::join!(self.tps(), self.finality_secs())
    }
}

/// Quote for one coin; every member is optional and validated separately
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarketQuote {
    pub price_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,
    pub change_24h_pct: Option<f64>,
}

#[async_trait]
pub trait MarketSource: Send + Sync {
    fn name(&self) -> &str;

    async fn quote(&self, coin: &CoinRef) -> AppResult<MarketQuote>;
}

#[async_trait]
pub trait TvlSource: Send + Sync {
    /// Total value locked, in USD, for the chain with this display name
    async fn chain_tvl(&self, chain_name: &str) -> AppResult<f64>;
}

/// Tries market sources in order, returning the first quote carrying a price
pub struct MarketChain {
    sources: Vec<Arc<dyn MarketSource>>,
}

impl MarketChain {
    pub fn new(sources: Vec<Arc<dyn MarketSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl MarketSource for MarketChain {
    fn name(&self) -> &str {
        "market-chain"
    }

    async fn quote(&self, coin: &CoinRef) -> AppResult<MarketQuote> {
        let mut last_error = None;
        for source in &self.sources {
            match source.quote(coin).await {
                Ok(quote) if quote.price_usd.is_some() => return Ok(quote),
                Ok(_) => {
                    debug!("{} returned no price for {}", source.name(), coin.symbol);
                    last_error = Some(AppError::missing(format!(
                        "{} returned no price for {}",
                        source.name(),
                        coin.symbol
                    )));
                }
                Err(e) => {
                    debug!("{} failed for {}: {}", source.name(), coin.symbol, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| AppError::missing("No market sources configured")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::COIN_SUI;

    struct Fixed(&'static str, AppResult<MarketQuote>);

    #[async_trait]
    impl MarketSource for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn quote(&self, _coin: &CoinRef) -> AppResult<MarketQuote> {
            match &self.1 {
                Ok(q) => Ok(*q),
                Err(e) => Err(e.detached()),
            }
        }
    }

    #[tokio::test]
    async fn test_market_chain_falls_through_to_second_source() {
        let chain = MarketChain::new(vec![
            Arc::new(Fixed("primary", Err(AppError::missing("down")))),
            Arc::new(Fixed(
                "secondary",
                Ok(MarketQuote {
                    price_usd: Some(1.5),
                    ..MarketQuote::default()
                }),
            )),
        ]);

        let quote = chain.quote(&COIN_SUI).await.unwrap();
        assert_eq!(quote.price_usd, Some(1.5));
    }

    #[tokio::test]
    async fn test_market_chain_reports_last_error() {
        let chain = MarketChain::new(vec![Arc::new(Fixed("only", Ok(MarketQuote::default())))]);
        assert!(chain.quote(&COIN_SUI).await.is_err());
        assert!(MarketChain::new(vec![]).quote(&COIN_SUI).await.is_err());
    }
}
