//! SIR Pulse Library
//!
//! Live per-network metric aggregation for SIR agent-runtime scoring:
//! - TPS, per-transaction cost, finality and uptime from chain endpoints
//! - Market cap, volume and 24h change from price APIs
//! - TVL from DefiLlama, developer activity from GitHub
//!
//! Every snapshot field is tagged `live` or `estimated`; a failed upstream
//! call degrades only its own field.

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    Clock, DeveloperActivityFetcher, NetworkMonitor, PollState, Poller, SnapshotFetcher,
};
pub use models::{
    AggregatorConfig, AppError, AppResult, DataQuality, DeveloperSnapshot, ErrorCode, Field,
    FallbackProfile, NetworkId, NetworkSnapshot,
};
