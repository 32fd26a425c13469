//! Providers Module - External Data Sources
//!
//! One typed client per upstream family. Providers never retry; a failed
//! call surfaces as an `AppError` and the caller decides the fallback.

pub mod coingecko;
pub mod coinmarketcap;
pub mod cosmos;
pub mod defillama;
pub mod github;
pub mod http;
pub mod rpc;
pub mod scanner;
pub mod solana;
pub mod sui;

pub use coingecko::CoinGeckoClient;
pub use coinmarketcap::CoinMarketCapClient;
pub use cosmos::CosmosRestClient;
pub use defillama::DefiLlamaClient;
pub use github::GitHubClient;
pub use rpc::{mask_url, RpcProvider};
pub use scanner::ScannerClient;
pub use solana::SolanaClient;
pub use sui::SuiClient;
