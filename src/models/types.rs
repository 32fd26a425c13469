//! Type definitions for SIR Pulse
//! Snapshot records, provenance tags and network identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::config::FallbackProfile;
use super::errors::AppError;

/// Networks tracked by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Ethereum,
    Solana,
    Polygon,
    Bsc,
    Base,
    Sei,
    Sui,
}

impl NetworkId {
    pub const ALL: [NetworkId; 7] = [
        NetworkId::Ethereum,
        NetworkId::Solana,
        NetworkId::Polygon,
        NetworkId::Bsc,
        NetworkId::Base,
        NetworkId::Sei,
        NetworkId::Sui,
    ];

    /// Lowercase slug used in config, logs and URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Ethereum => "ethereum",
            NetworkId::Solana => "solana",
            NetworkId::Polygon => "polygon",
            NetworkId::Bsc => "bsc",
            NetworkId::Base => "base",
            NetworkId::Sei => "sei",
            NetworkId::Sui => "sui",
        }
    }

    /// Human-readable name (also the DefiLlama chain name)
    pub fn display_name(&self) -> &'static str {
        match self {
            NetworkId::Ethereum => "Ethereum",
            NetworkId::Solana => "Solana",
            NetworkId::Polygon => "Polygon",
            NetworkId::Bsc => "BSC",
            NetworkId::Base => "Base",
            NetworkId::Sei => "Sei",
            NetworkId::Sui => "Sui",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for NetworkId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim().to_lowercase();
        NetworkId::ALL
            .into_iter()
            .find(|n| n.as_str() == slug || (slug == "bnb" && *n == NetworkId::Bsc))
            .ok_or_else(|| AppError::unknown_network(s))
    }
}

/// Snapshot field names (keys of the data-quality map)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Tps,
    GasPrice,
    Finality,
    Uptime,
    MarketCap,
    #[serde(rename = "volume24h")]
    Volume24h,
    #[serde(rename = "priceChange24h")]
    PriceChange24h,
    Tvl,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Tps,
        Field::GasPrice,
        Field::Finality,
        Field::Uptime,
        Field::MarketCap,
        Field::Volume24h,
        Field::PriceChange24h,
        Field::Tvl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Tps => "tps",
            Field::GasPrice => "gasPrice",
            Field::Finality => "finality",
            Field::Uptime => "uptime",
            Field::MarketCap => "marketCap",
            Field::Volume24h => "volume24h",
            Field::PriceChange24h => "priceChange24h",
            Field::Tvl => "tvl",
        }
    }
}

/// Provenance of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    /// Produced by a successful upstream call
    Live,
    /// Hard-coded fallback constant
    Estimated,
}

impl DataQuality {
    pub fn from_live(live: bool) -> Self {
        if live {
            DataQuality::Live
        } else {
            DataQuality::Estimated
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataQuality::Live => "live",
            DataQuality::Estimated => "estimated",
        }
    }
}

/// All metrics fetched for one network at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub network: NetworkId,
    pub tps: Option<f64>,
    pub gas_price: Option<String>,
    pub finality: String,
    pub uptime: f64,
    pub market_cap: String,
    #[serde(rename = "volume24h")]
    pub volume_24h: String,
    #[serde(rename = "priceChange24h")]
    pub price_change_24h: f64,
    pub tvl: String,
    pub last_updated: DateTime<Utc>,
    pub data_quality: BTreeMap<Field, DataQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NetworkSnapshot {
    /// Snapshot built entirely from fallback constants (top-level failure path)
    pub fn fallback(
        network: NetworkId,
        profile: &FallbackProfile,
        last_updated: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        let data_quality = Field::ALL
            .into_iter()
            .map(|f| (f, DataQuality::Estimated))
            .collect();

        Self {
            network,
            tps: Some(profile.tps),
            gas_price: Some(profile.gas_price.to_string()),
            finality: profile.finality.to_string(),
            uptime: profile.uptime,
            market_cap: profile.market_cap.to_string(),
            volume_24h: profile.volume_24h.to_string(),
            price_change_24h: profile.price_change_24h,
            tvl: profile.tvl.to_string(),
            last_updated,
            data_quality,
            error: Some(error.into()),
        }
    }

    pub fn quality(&self, field: Field) -> Option<DataQuality> {
        self.data_quality.get(&field).copied()
    }

    pub fn is_live(&self, field: Field) -> bool {
        self.quality(field) == Some(DataQuality::Live)
    }

    /// Number of fields backed by live upstream data
    pub fn live_count(&self) -> usize {
        self.data_quality
            .values()
            .filter(|q| **q == DataQuality::Live)
            .count()
    }
}

/// Coarse maturity label for a developer ecosystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcosystemStage {
    Dominant,
    Mature,
    Growing,
    Emerging,
}

/// Developer-activity field names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeveloperField {
    ActiveDevelopers,
    Repositories,
    MonthlyCommits,
    Ecosystem,
}

/// Auxiliary developer-activity signal for one network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperSnapshot {
    pub network: NetworkId,
    pub active_developers: u32,
    pub repositories: u64,
    pub monthly_commits: u32,
    pub ecosystem: EcosystemStage,
    pub is_live_data: bool,
    pub last_updated: DateTime<Utc>,
    pub data_quality: BTreeMap<DeveloperField, DataQuality>,
}
