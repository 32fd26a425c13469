//! API Request/Response Types

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::{DeveloperReport, PollState};
use crate::models::errors::AppError;
use crate::models::types::{NetworkId, NetworkSnapshot};

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "API_RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Health
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Networks with at least one resolved snapshot
    pub networks_ready: usize,
    pub networks_total: usize,
}

// ============================================
// Snapshots
// ============================================

/// Poll state of one network as served by the API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStateData {
    pub network: NetworkId,
    pub name: &'static str,
    #[serde(flatten)]
    pub state: PollState<NetworkSnapshot>,
}

impl NetworkStateData {
    pub fn new(network: NetworkId, state: PollState<NetworkSnapshot>) -> Self {
        Self {
            network,
            name: network.display_name(),
            state,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NetworksData {
    pub networks: Vec<NetworkStateData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopersData {
    pub snapshot: Option<Arc<DeveloperReport>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl From<PollState<DeveloperReport>> for DevelopersData {
    fn from(state: PollState<DeveloperReport>) -> Self {
        Self {
            snapshot: state.snapshot,
            loading: state.loading,
            error: state.error,
        }
    }
}

/// Compact per-network view for dashboards that only need the headline fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub tps: Option<f64>,
    pub gas_price: Option<String>,
    pub live_fields: usize,
}

impl From<&NetworkSnapshot> for SummaryRow {
    fn from(s: &NetworkSnapshot) -> Self {
        Self {
            tps: s.tps,
            gas_price: s.gas_price.clone(),
            live_fields: s.live_count(),
        }
    }
}

pub type SummaryData = BTreeMap<NetworkId, SummaryRow>;
