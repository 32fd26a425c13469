//! CoinGecko API Client
//!
//! `simple/price` with 24h change, market cap and 24h volume for one coin id.
//! Free tier, no key required; `COINGECKO_API_KEY` is sent as the demo key
//! header when present.
//!
//! API: https://api.coingecko.com/api/v3/simple/price

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::http::{build_client, send_json};
use crate::core::sources::{MarketQuote, MarketSource};
use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::CoinRef;

/// One coin entry of the `simple/price` response
#[derive(Debug, Clone, Deserialize)]
pub struct SimplePrice {
    pub usd: Option<f64>,
    pub usd_market_cap: Option<f64>,
    pub usd_24h_vol: Option<f64>,
    pub usd_24h_change: Option<f64>,
}

impl From<SimplePrice> for MarketQuote {
    fn from(p: SimplePrice) -> Self {
        MarketQuote {
            price_usd: p.usd,
            market_cap_usd: p.usd_market_cap,
            volume_24h_usd: p.usd_24h_vol,
            change_24h_pct: p.usd_24h_change,
        }
    }
}

/// CoinGecko API client
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Fetch price, market cap, volume and 24h change for one coin id
    pub async fn simple_price(&self, coin_id: &str) -> AppResult<SimplePrice> {
        let url = format!("{}/simple/price", self.base_url);
        debug!("💰 CoinGecko: quoting {}", coin_id);

        let mut request = self.client.get(&url).query(&[
            ("ids", coin_id),
            ("vs_currencies", "usd"),
            ("include_24hr_change", "true"),
            ("include_market_cap", "true"),
            ("include_24hr_vol", "true"),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let mut body: HashMap<String, SimplePrice> = send_json(request, "coingecko").await?;
        body.remove(coin_id)
            .ok_or_else(|| AppError::missing(format!("CoinGecko has no entry for {}", coin_id)))
    }
}

#[async_trait]
impl MarketSource for CoinGeckoClient {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn quote(&self, coin: &CoinRef) -> AppResult<MarketQuote> {
        self.simple_price(coin.coingecko_id).await.map(MarketQuote::from)
    }
}
