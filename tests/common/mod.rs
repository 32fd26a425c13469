//! Scripted upstream sources shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

use sir_pulse::core::sources::{ChainSource, GasReading, MarketQuote, MarketSource, TvlSource};
use sir_pulse::core::{FixedClock, SnapshotFetcher};
use sir_pulse::utils::constants::CoinRef;
use sir_pulse::{AppError, AppResult, NetworkId};

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// How a scripted call behaves
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Value(f64),
    Fail,
    /// Never answers within any sane timeout
    Hang,
    Panic,
}

impl Reply {
    async fn resolve(self, what: &str) -> AppResult<f64> {
        match self {
            Reply::Value(v) => Ok(v),
            Reply::Fail => Err(AppError::missing(format!("{} unavailable", what))),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(1.0)
            }
            Reply::Panic => panic!("{} exploded", what),
        }
    }
}

pub struct MockChain {
    pub network: NetworkId,
    pub tps: Reply,
    /// Smallest-unit price per gas unit
    pub gas: Reply,
    pub uptime: Option<Reply>,
    pub finality: Option<Reply>,
}

impl MockChain {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            tps: Reply::Fail,
            gas: Reply::Fail,
            uptime: None,
            finality: None,
        }
    }
}

#[async_trait]
impl ChainSource for MockChain {
    fn network(&self) -> NetworkId {
        self.network
    }

    async fn tps(&self) -> AppResult<f64> {
        self.tps.resolve("tps").await
    }

    async fn gas_price(&self) -> AppResult<GasReading> {
        let price_per_unit = self.gas.resolve("gas").await?;
        Ok(GasReading { price_per_unit })
    }

    async fn uptime(&self) -> AppResult<f64> {
        match self.uptime {
            Some(reply) => reply.resolve("uptime").await,
            None => Err(AppError::unsupported("uptime")),
        }
    }

    async fn finality_secs(&self) -> AppResult<f64> {
        match self.finality {
            Some(reply) => reply.resolve("finality").await,
            None => Err(AppError::unsupported("finality")),
        }
    }
}

/// Answers every coin with the same quote, or fails
pub struct MockMarket {
    pub quote: Option<MarketQuote>,
    pub hang: bool,
}

impl MockMarket {
    pub fn quoting(price: f64, market_cap: f64, volume: f64, change: f64) -> Self {
        Self {
            quote: Some(MarketQuote {
                price_usd: Some(price),
                market_cap_usd: Some(market_cap),
                volume_24h_usd: Some(volume),
                change_24h_pct: Some(change),
            }),
            hang: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            quote: None,
            hang: false,
        }
    }
}

#[async_trait]
impl MarketSource for MockMarket {
    fn name(&self) -> &str {
        "mock-market"
    }

    async fn quote(&self, coin: &CoinRef) -> AppResult<MarketQuote> {
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
        }
        self.quote
            .ok_or_else(|| AppError::missing(format!("no quote for {}", coin.symbol)))
    }
}

pub struct MockTvl(pub Reply);

#[async_trait]
impl TvlSource for MockTvl {
    async fn chain_tvl(&self, _chain_name: &str) -> AppResult<f64> {
        self.0.resolve("tvl").await
    }
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

pub fn fetcher(chain: MockChain, market: MockMarket, tvl: Reply) -> SnapshotFetcher {
    SnapshotFetcher::new(Arc::new(chain), Arc::new(market), Arc::new(MockTvl(tvl)), TIMEOUT)
        .with_clock(Arc::new(FixedClock(fixed_time())))
}

/// Sui with every upstream answering usable values
pub fn healthy_sui() -> SnapshotFetcher {
    let chain = MockChain {
        network: NetworkId::Sui,
        tps: Reply::Value(2_000.0),
        gas: Reply::Value(750.0),
        uptime: Some(Reply::Value(99.5)),
        finality: Some(Reply::Value(0.4)),
    };
    fetcher(
        chain,
        MockMarket::quoting(2.0, 3_200_000_000.0, 890_000_000.0, 1.8),
        Reply::Value(1_100_000_000.0),
    )
}
