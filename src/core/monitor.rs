//! Network Monitor - one poller per network plus developer activity

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::chains::build_chain_source;
use super::developer::{DeveloperActivityFetcher, DeveloperReport};
use super::fetcher::SnapshotFetcher;
use super::poller::{PollState, Poller};
use super::sources::{MarketChain, MarketSource, TvlSource};
use crate::models::config::AggregatorConfig;
use crate::models::errors::AppResult;
use crate::models::types::{NetworkId, NetworkSnapshot};
use crate::providers::{CoinGeckoClient, CoinMarketCapClient, DefiLlamaClient, GitHubClient};

pub struct NetworkMonitor {
    pollers: BTreeMap<NetworkId, Poller<NetworkSnapshot>>,
    developer: Option<Poller<DeveloperReport>>,
}

impl NetworkMonitor {
    /// Build every provider from config and start polling
    pub fn start(config: &AggregatorConfig) -> AppResult<Self> {
        let endpoints = &config.endpoints;
        let keys = &config.api_keys;

        let mut markets: Vec<Arc<dyn MarketSource>> = vec![Arc::new(CoinGeckoClient::new(
            endpoints.coingecko_url.clone(),
            keys.coingecko.clone(),
        )?)];
        if let Some(key) = &keys.coinmarketcap {
            markets.push(Arc::new(CoinMarketCapClient::new(
                endpoints.coinmarketcap_url.clone(),
                key.clone(),
            )?));
        }
        let market: Arc<dyn MarketSource> = Arc::new(MarketChain::new(markets));
        let tvl: Arc<dyn TvlSource> = Arc::new(DefiLlamaClient::new(endpoints.defillama_url.clone())?);

        let mut fetchers = Vec::with_capacity(config.networks.len());
        for network in &config.networks {
            let chain = build_chain_source(*network, config)?;
            fetchers.push(SnapshotFetcher::new(
                chain,
                market.clone(),
                tvl.clone(),
                config.fetch_timeout,
            ));
        }

        let developer = DeveloperActivityFetcher::new(
            GitHubClient::new(endpoints.github_url.clone(), keys.github.clone())?,
            config.networks.clone(),
            config.fetch_timeout,
        );

        Ok(Self::from_parts(
            fetchers,
            Some(developer),
            config.refresh_interval,
            config.developer_refresh_interval,
        ))
    }

    /// Start pollers over prepared fetchers
    pub fn from_parts(
        fetchers: Vec<SnapshotFetcher>,
        developer: Option<DeveloperActivityFetcher>,
        refresh_interval: Duration,
        developer_refresh_interval: Duration,
    ) -> Self {
        let pollers: BTreeMap<_, _> = fetchers
            .into_iter()
            .map(|f| (f.network(), Poller::start(Arc::new(f), refresh_interval)))
            .collect();
        let developer = developer.map(|d| Poller::start(Arc::new(d), developer_refresh_interval));

        info!(
            "🚀 Monitoring {} networks (developer activity: {})",
            pollers.len(),
            if developer.is_some() { "on" } else { "off" }
        );

        Self { pollers, developer }
    }

    pub fn networks(&self) -> Vec<NetworkId> {
        self.pollers.keys().copied().collect()
    }

    pub fn state(&self, network: NetworkId) -> Option<PollState<NetworkSnapshot>> {
        self.pollers.get(&network).map(Poller::state)
    }

    pub fn latest(&self, network: NetworkId) -> Option<Arc<NetworkSnapshot>> {
        self.pollers.get(&network).and_then(Poller::latest)
    }

    pub fn all_states(&self) -> BTreeMap<NetworkId, PollState<NetworkSnapshot>> {
        self.pollers.iter().map(|(n, p)| (*n, p.state())).collect()
    }

    pub fn all_latest(&self) -> BTreeMap<NetworkId, Arc<NetworkSnapshot>> {
        self.pollers
            .iter()
            .filter_map(|(n, p)| p.latest().map(|s| (*n, s)))
            .collect()
    }

    pub fn poller(&self, network: NetworkId) -> Option<&Poller<NetworkSnapshot>> {
        self.pollers.get(&network)
    }

    pub fn developer_state(&self) -> Option<PollState<DeveloperReport>> {
        self.developer.as_ref().map(Poller::state)
    }

    pub fn developer_latest(&self) -> Option<Arc<DeveloperReport>> {
        self.developer.as_ref().and_then(Poller::latest)
    }

    pub fn stop(&self) {
        for poller in self.pollers.values() {
            poller.stop();
        }
        if let Some(developer) = &self.developer {
            developer.stop();
        }
        info!("🛑 Monitor stopped");
    }
}
