//! Constants Module - Single Source of Truth
//!
//! Endpoints, coin identifiers, per-chain fee parameters and the
//! developer-activity baselines. Other modules read from here instead of
//! embedding literals.

use crate::models::types::{EcosystemStage, NetworkId};

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "SIR Pulse";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for upstream HTTP requests (GitHub rejects requests without one)
pub const USER_AGENT: &str = concat!("sir-pulse/", env!("CARGO_PKG_VERSION"));

// ============================================
// TIMING
// ============================================

/// Per-branch timeout inside one snapshot fetch
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Refresh interval for chain/price snapshots
pub const DEFAULT_REFRESH_MS: u64 = 30_000;

/// Refresh interval for developer activity
pub const DEFAULT_DEVELOPER_REFRESH_MS: u64 = 300_000;

/// Transport-level backstop; the per-branch timeout normally fires first
pub const HTTP_CLIENT_TIMEOUT_SECS: u64 = 15;

/// Number of blocks walked back from the tip for TPS sampling
pub const TPS_BLOCK_WINDOW: u64 = 10;

/// Solana performance samples requested (one sample = ~60s)
pub const SOLANA_PERF_SAMPLES: usize = 10;

// ============================================
// UPSTREAM ENDPOINTS
// ============================================

/// Etherscan V2 multichain API (Ethereum, Polygon, BSC selected by chainid)
pub const ETHERSCAN_V2_URL: &str = "https://api.etherscan.io/v2/api";
pub const COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const COINMARKETCAP_URL: &str = "https://pro-api.coinmarketcap.com";
pub const DEFILLAMA_URL: &str = "https://api.llama.fi";
pub const GITHUB_API_URL: &str = "https://api.github.com";

pub const BASE_RPC_URL: &str = "https://mainnet.base.org";
pub const SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const SEI_REST_URL: &str = "https://sei-rest.publicnode.com";
pub const SEI_EVM_RPC_URL: &str = "https://evm-rpc.sei-apis.com";

/// Sui fullnodes, tried in order once per call
pub const SUI_RPC_URLS: [&str; 3] = [
    "https://fullnode.mainnet.sui.io:443",
    "https://sui-rpc.publicnode.com",
    "https://sui-mainnet-endpoint.blockvision.org",
];

/// Etherscan-family chain ids
pub const CHAIN_ID_ETHEREUM: u64 = 1;
pub const CHAIN_ID_BSC: u64 = 56;
pub const CHAIN_ID_POLYGON: u64 = 137;

// ============================================
// FEE MODEL
// ============================================

/// Solana base fee per signature (lamports)
pub const SOLANA_BASE_FEE_LAMPORTS: f64 = 5_000.0;

/// Compute budget assumed when pricing the Solana priority fee
pub const SOLANA_COMPUTE_UNITS: f64 = 200_000.0;

/// Market-data coin reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinRef {
    /// CoinGecko id
    pub coingecko_id: &'static str,
    /// Ticker used by CoinMarketCap
    pub symbol: &'static str,
}

pub const COIN_ETH: CoinRef = CoinRef { coingecko_id: "ethereum", symbol: "ETH" };
pub const COIN_SOL: CoinRef = CoinRef { coingecko_id: "solana", symbol: "SOL" };
pub const COIN_POL: CoinRef = CoinRef { coingecko_id: "polygon-ecosystem-token", symbol: "POL" };
pub const COIN_BNB: CoinRef = CoinRef { coingecko_id: "binancecoin", symbol: "BNB" };
pub const COIN_SEI: CoinRef = CoinRef { coingecko_id: "sei-network", symbol: "SEI" };
pub const COIN_SUI: CoinRef = CoinRef { coingecko_id: "sui", symbol: "SUI" };

/// Static per-chain parameters used to turn raw readings into snapshot fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainParams {
    /// Token that pays for gas
    pub native_coin: CoinRef,
    /// Token whose market data represents the network (None: no own token)
    pub market_coin: Option<CoinRef>,
    /// Gas units charged for a plain transfer (1 when the reading is already per-tx)
    pub gas_units_per_tx: f64,
    /// Decimals of the smallest native unit (wei 18, lamports 9, MIST 9)
    pub native_decimals: i32,
    /// Decimal places in the formatted USD cost
    pub gas_precision: usize,
}

pub fn chain_params(network: NetworkId) -> ChainParams {
    match network {
        NetworkId::Ethereum => ChainParams {
            native_coin: COIN_ETH,
            market_coin: Some(COIN_ETH),
            gas_units_per_tx: 21_000.0,
            native_decimals: 18,
            gas_precision: 2,
        },
        NetworkId::Solana => ChainParams {
            native_coin: COIN_SOL,
            market_coin: Some(COIN_SOL),
            gas_units_per_tx: 1.0,
            native_decimals: 9,
            gas_precision: 6,
        },
        NetworkId::Polygon => ChainParams {
            native_coin: COIN_POL,
            market_coin: Some(COIN_POL),
            gas_units_per_tx: 21_000.0,
            native_decimals: 18,
            gas_precision: 6,
        },
        NetworkId::Bsc => ChainParams {
            native_coin: COIN_BNB,
            market_coin: Some(COIN_BNB),
            gas_units_per_tx: 21_000.0,
            native_decimals: 18,
            gas_precision: 4,
        },
        // Base pays gas in ETH and has no token of its own
        NetworkId::Base => ChainParams {
            native_coin: COIN_ETH,
            market_coin: None,
            gas_units_per_tx: 21_000.0,
            native_decimals: 18,
            gas_precision: 4,
        },
        // Sei EVM reports gas in 18-decimal wei
        NetworkId::Sei => ChainParams {
            native_coin: COIN_SEI,
            market_coin: Some(COIN_SEI),
            gas_units_per_tx: 21_000.0,
            native_decimals: 18,
            gas_precision: 4,
        },
        NetworkId::Sui => ChainParams {
            native_coin: COIN_SUI,
            market_coin: Some(COIN_SUI),
            gas_units_per_tx: 2_000.0,
            native_decimals: 9,
            gas_precision: 4,
        },
    }
}

// ============================================
// DEVELOPER ACTIVITY
// ============================================

/// GitHub repository-search queries per network
pub fn github_queries(network: NetworkId) -> [&'static str; 3] {
    match network {
        NetworkId::Ethereum => [
            "ethereum language:solidity",
            "ethereum language:javascript",
            "ethereum language:typescript",
        ],
        NetworkId::Solana => [
            "solana language:rust",
            "solana language:javascript",
            "solana language:typescript",
        ],
        NetworkId::Polygon => [
            "polygon language:solidity",
            "polygon language:javascript",
            "polygon language:typescript",
        ],
        NetworkId::Bsc => [
            "bsc language:solidity",
            "bsc language:javascript",
            "bsc language:typescript",
        ],
        NetworkId::Base => [
            "base language:solidity",
            "base language:javascript",
            "base language:typescript",
        ],
        NetworkId::Sei => [
            "sei language:rust",
            "sei language:javascript",
            "sei language:typescript",
        ],
        NetworkId::Sui => [
            "sui language:rust",
            "sui language:javascript",
            "sui language:typescript",
        ],
    }
}

/// Baseline developer figures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperBaseline {
    pub active_developers: u32,
    pub repositories: u64,
    pub monthly_commits: u32,
    pub ecosystem: EcosystemStage,
}

pub fn developer_baseline(network: NetworkId) -> DeveloperBaseline {
    let (active_developers, repositories, monthly_commits, ecosystem) = match network {
        NetworkId::Ethereum => (8_500, 8_386, 45_000, EcosystemStage::Dominant),
        NetworkId::Solana => (3_200, 8_045, 28_000, EcosystemStage::Mature),
        NetworkId::Polygon => (2_100, 3_200, 18_000, EcosystemStage::Mature),
        NetworkId::Bsc => (2_800, 4_200, 22_000, EcosystemStage::Mature),
        NetworkId::Base => (1_200, 4_000, 15_000, EcosystemStage::Growing),
        NetworkId::Sei => (450, 850, 8_000, EcosystemStage::Emerging),
        NetworkId::Sui => (680, 1_200, 12_000, EcosystemStage::Emerging),
    };

    DeveloperBaseline {
        active_developers,
        repositories,
        monthly_commits,
        ecosystem,
    }
}
