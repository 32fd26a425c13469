//! CoinMarketCap quotes (secondary market source, needs `CMC_API_KEY`)
//!
//! API: https://pro-api.coinmarketcap.com/v2/cryptocurrency/quotes/latest?symbol=SUI

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use super::http::{build_client, send_json};
use crate::core::sources::{MarketQuote, MarketSource};
use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::CoinRef;

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    #[serde(default)]
    data: HashMap<String, Vec<CmcAsset>>,
}

#[derive(Debug, Deserialize)]
struct CmcAsset {
    quote: HashMap<String, CmcQuote>,
}

#[derive(Debug, Deserialize)]
struct CmcQuote {
    price: Option<f64>,
    market_cap: Option<f64>,
    volume_24h: Option<f64>,
    percent_change_24h: Option<f64>,
}

pub struct CoinMarketCapClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CoinMarketCapClient {
    pub fn new(base_url: impl Into<String>, api_key: String) -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl MarketSource for CoinMarketCapClient {
    fn name(&self) -> &str {
        "coinmarketcap"
    }

    async fn quote(&self, coin: &CoinRef) -> AppResult<MarketQuote> {
        let url = format!("{}/v2/cryptocurrency/quotes/latest", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("symbol", coin.symbol)])
            .header("X-CMC_PRO_API_KEY", &self.api_key);

        let mut body: QuotesResponse = send_json(request, "coinmarketcap").await?;

        // Several assets can share a ticker; CMC ranks the canonical one first
        let usd = body
            .data
            .remove(coin.symbol)
            .and_then(|assets| assets.into_iter().next())
            .and_then(|mut asset| asset.quote.remove("USD"))
            .ok_or_else(|| AppError::missing(format!("CoinMarketCap has no USD quote for {}", coin.symbol)))?;

        Ok(MarketQuote {
            price_usd: usd.price,
            market_cap_usd: usd.market_cap,
            volume_24h_usd: usd.volume_24h,
            change_24h_pct: usd.percent_change_24h,
        })
    }
}
