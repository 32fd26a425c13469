//! Configuration module for SIR Pulse
//!
//! Environment-driven settings plus the per-network fallback constants.
//! Missing optional API keys only degrade the upstream that needs them.

use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use super::errors::{AppError, AppResult};
use super::types::NetworkId;
use crate::utils::constants::{
    BASE_RPC_URL, COINGECKO_URL, COINMARKETCAP_URL, DEFAULT_DEVELOPER_REFRESH_MS,
    DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_REFRESH_MS, DEFILLAMA_URL, ETHERSCAN_V2_URL, GITHUB_API_URL,
    SEI_EVM_RPC_URL, SEI_REST_URL, SOLANA_RPC_URL, SUI_RPC_URLS,
};

/// Known-good constants substituted when a field cannot be fetched live
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackProfile {
    pub tps: f64,
    pub gas_price: &'static str,
    pub finality: &'static str,
    pub uptime: f64,
    pub market_cap: &'static str,
    pub volume_24h: &'static str,
    pub price_change_24h: f64,
    pub tvl: &'static str,
}

impl FallbackProfile {
    pub fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Ethereum => Self {
                tps: 15.0,
                gas_price: "$2.50",
                finality: "12s",
                uptime: 99.95,
                market_cap: "$445.8B",
                volume_24h: "$12.4B",
                price_change_24h: 0.1,
                tvl: "$45.2B",
            },
            NetworkId::Solana => Self {
                tps: 3000.0,
                gas_price: "$0.002",
                finality: "0.8s",
                uptime: 98.1,
                market_cap: "$89.2B",
                volume_24h: "$2.1B",
                price_change_24h: -0.8,
                tvl: "$8.5B",
            },
            NetworkId::Polygon => Self {
                tps: 350.0,
                gas_price: "$0.001",
                finality: "2.3s",
                uptime: 98.8,
                market_cap: "$11.7B",
                volume_24h: "$623M",
                price_change_24h: -1.2,
                tvl: "$1.2B",
            },
            NetworkId::Bsc => Self {
                tps: 300.0,
                gas_price: "$0.15",
                finality: "3s",
                uptime: 99.2,
                market_cap: "$45.2B",
                volume_24h: "$1.8B",
                price_change_24h: 0.2,
                tvl: "$3.2B",
            },
            // Optimistic rollup: full finality after the challenge window
            NetworkId::Base => Self {
                tps: 100.0,
                gas_price: "$0.05",
                finality: "7 days",
                uptime: 99.5,
                market_cap: "$8.1B",
                volume_24h: "$456M",
                price_change_24h: 1.5,
                tvl: "$2.1B",
            },
            NetworkId::Sei => Self {
                tps: 12000.0,
                gas_price: "$0.0008",
                finality: "0.4s",
                uptime: 99.9,
                market_cap: "$2.4B",
                volume_24h: "$145M",
                price_change_24h: 2.1,
                tvl: "$250.0M",
            },
            NetworkId::Sui => Self {
                tps: 8000.0,
                gas_price: "$0.001",
                finality: "0.5s",
                uptime: 99.5,
                market_cap: "$3.2B",
                volume_24h: "$89M",
                price_change_24h: 1.8,
                tvl: "$1.1B",
            },
        }
    }
}

/// Optional upstream credentials
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub etherscan: Option<String>,
    pub polygonscan: Option<String>,
    pub bscscan: Option<String>,
    pub coingecko: Option<String>,
    pub coinmarketcap: Option<String>,
    pub github: Option<String>,
}

impl ApiKeys {
    /// Read keys from the environment; placeholders count as absent.
    /// Keys are never logged.
    pub fn from_env() -> Self {
        let keys = Self {
            etherscan: env_key("ETHERSCAN_API_KEY"),
            polygonscan: env_key("POLYGONSCAN_API_KEY"),
            bscscan: env_key("BSCSCAN_API_KEY"),
            coingecko: env_key("COINGECKO_API_KEY"),
            coinmarketcap: env_key("CMC_API_KEY"),
            github: env_key("GITHUB_TOKEN"),
        };

        for (name, present) in [
            ("ETHERSCAN_API_KEY", keys.etherscan.is_some()),
            ("CMC_API_KEY", keys.coinmarketcap.is_some()),
            ("GITHUB_TOKEN", keys.github.is_some()),
        ] {
            if present {
                info!("🔑 {} configured (key hidden)", name);
            }
        }

        keys
    }

    /// Scanner key for a network; Etherscan V2 keys work across its chains
    pub fn scanner_key(&self, network: NetworkId) -> Option<String> {
        let own = match network {
            NetworkId::Polygon => self.polygonscan.clone(),
            NetworkId::Bsc => self.bscscan.clone(),
            _ => None,
        };
        own.or_else(|| self.etherscan.clone())
    }
}

/// Upstream base URLs (overridable for self-hosted nodes and tests)
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub scanner_url: String,
    pub coingecko_url: String,
    pub coinmarketcap_url: String,
    pub defillama_url: String,
    pub github_url: String,
    pub ethereum_rpc: Option<String>,
    pub base_rpc: Vec<String>,
    pub solana_rpc: Vec<String>,
    pub sui_rpc: Vec<String>,
    pub sei_rest: String,
    pub sei_evm_rpc: Vec<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            scanner_url: ETHERSCAN_V2_URL.to_string(),
            coingecko_url: COINGECKO_URL.to_string(),
            coinmarketcap_url: COINMARKETCAP_URL.to_string(),
            defillama_url: DEFILLAMA_URL.to_string(),
            github_url: GITHUB_API_URL.to_string(),
            ethereum_rpc: None,
            base_rpc: vec![BASE_RPC_URL.to_string()],
            solana_rpc: vec![SOLANA_RPC_URL.to_string()],
            sui_rpc: SUI_RPC_URLS.iter().map(|u| u.to_string()).collect(),
            sei_rest: SEI_REST_URL.to_string(),
            sei_evm_rpc: vec![SEI_EVM_RPC_URL.to_string()],
        }
    }
}

impl EndpointConfig {
    pub fn from_env() -> Self {
        let mut endpoints = Self::default();

        endpoints.ethereum_rpc = env_key("ETH_HTTP_URL");
        if let Some(urls) = env_list("BASE_HTTP_URL") {
            endpoints.base_rpc = urls;
        }
        if let Some(urls) = env_list("SOLANA_HTTP_URL") {
            endpoints.solana_rpc = urls;
        }
        if let Some(urls) = env_list("SUI_HTTP_URLS") {
            endpoints.sui_rpc = urls;
        }
        if let Some(url) = env_key("SEI_REST_URL") {
            endpoints.sei_rest = url;
        }
        if let Some(urls) = env_list("SEI_EVM_URL") {
            endpoints.sei_evm_rpc = urls;
        }

        endpoints
    }
}

/// Aggregator configuration
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Per-branch timeout inside one fetch
    pub fetch_timeout: Duration,
    /// Poll interval for network snapshots
    pub refresh_interval: Duration,
    /// Poll interval for developer activity
    pub developer_refresh_interval: Duration,
    /// Networks to monitor
    pub networks: Vec<NetworkId>,
    pub endpoints: EndpointConfig,
    pub api_keys: ApiKeys,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_MS),
            developer_refresh_interval: Duration::from_millis(DEFAULT_DEVELOPER_REFRESH_MS),
            networks: NetworkId::ALL.to_vec(),
            endpoints: EndpointConfig::default(),
            api_keys: ApiKeys::default(),
        }
    }
}

impl AggregatorConfig {
    /// Build from environment variables, falling back to defaults
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let fetch_timeout = env_millis("SIR_FETCH_TIMEOUT_MS")?.unwrap_or(defaults.fetch_timeout);
        let refresh_interval = env_millis("SIR_REFRESH_MS")?.unwrap_or(defaults.refresh_interval);
        let developer_refresh_interval =
            env_millis("SIR_DEVELOPER_REFRESH_MS")?.unwrap_or(defaults.developer_refresh_interval);

        let networks = match std::env::var("SIR_NETWORKS") {
            Ok(list) if !list.trim().is_empty() => parse_networks(&list)?,
            _ => defaults.networks,
        };

        let config = Self {
            fetch_timeout,
            refresh_interval,
            developer_refresh_interval,
            networks,
            endpoints: EndpointConfig::from_env(),
            api_keys: ApiKeys::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.fetch_timeout.is_zero() {
            return Err(AppError::invalid_config("fetch timeout must be positive"));
        }
        if self.refresh_interval.is_zero() || self.developer_refresh_interval.is_zero() {
            return Err(AppError::invalid_config("refresh interval must be positive"));
        }
        if self.fetch_timeout >= self.refresh_interval {
            warn!(
                "⚠️ Fetch timeout ({:?}) is not shorter than refresh interval ({:?}); polls will overlap",
                self.fetch_timeout, self.refresh_interval
            );
        }
        Ok(())
    }
}

/// Parse a comma-separated network list, dropping duplicates
pub fn parse_networks(list: &str) -> AppResult<Vec<NetworkId>> {
    let mut networks = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let network = NetworkId::from_str(part)?;
        if !networks.contains(&network) {
            networks.push(network);
        }
    }
    Ok(networks)
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "YourApiKeyToken" && v != "YOUR_API_KEY")
}

fn env_list(name: &str) -> Option<Vec<String>> {
    env_key(name).map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn env_millis(name: &str) -> AppResult<Option<Duration>> {
    match env_key(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| AppError::invalid_config(format!("{} must be milliseconds, got {:?}", name, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_design() {
        let config = AggregatorConfig::default();
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.developer_refresh_interval, Duration::from_secs(300));
        assert_eq!(config.networks.len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_networks() {
        let networks = parse_networks("sui, Ethereum,sui,,bnb").unwrap();
        assert_eq!(networks, vec![NetworkId::Sui, NetworkId::Ethereum, NetworkId::Bsc]);
        assert!(parse_networks("ethereum,dogechain").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = AggregatorConfig {
            fetch_timeout: Duration::ZERO,
            ..AggregatorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scanner_key_falls_back_to_etherscan() {
        let keys = ApiKeys {
            etherscan: Some("eth".into()),
            bscscan: Some("bsc".into()),
            ..ApiKeys::default()
        };
        assert_eq!(keys.scanner_key(NetworkId::Bsc).as_deref(), Some("bsc"));
        assert_eq!(keys.scanner_key(NetworkId::Polygon).as_deref(), Some("eth"));
    }

    #[test]
    fn test_every_network_has_fallback_profile() {
        for network in NetworkId::ALL {
            let profile = FallbackProfile::for_network(network);
            assert!(profile.tps > 0.0);
            assert!(profile.gas_price.starts_with('$'));
            assert!((0.0..=100.0).contains(&profile.uptime));
        }
    }
}
