//! API Request Handlers

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;

use super::types::*;
use crate::core::NetworkMonitor;
use crate::models::errors::AppError;
use crate::models::types::NetworkId;
use crate::utils::constants::APP_VERSION;

/// Shared application state
pub struct AppState {
    pub monitor: Arc<NetworkMonitor>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(monitor: Arc<NetworkMonitor>) -> Self {
        Self {
            monitor,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

fn latency(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn error_response(err: AppError, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    let status = StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiResponse::error(ApiError::from(&err), latency(start))))
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();
    let networks = state.monitor.networks();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        networks_ready: state.monitor.all_latest().len(),
        networks_total: networks.len(),
    };

    Json(ApiResponse::success(data, latency(start)))
}

// ============================================
// Network Snapshots
// ============================================

pub async fn list_networks(State(state): State<Arc<AppState>>) -> Json<ApiResponse<NetworksData>> {
    let start = Instant::now();

    let networks = state
        .monitor
        .all_states()
        .into_iter()
        .map(|(network, poll)| NetworkStateData::new(network, poll))
        .collect();

    Json(ApiResponse::success(NetworksData { networks }, latency(start)))
}

pub async fn get_network(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<NetworkStateData> {
    let start = Instant::now();

    let network: NetworkId = id
        .parse()
        .map_err(|_| error_response(AppError::not_found(format!("Unknown network: {}", id)), start))?;

    let poll = state.monitor.state(network).ok_or_else(|| {
        error_response(
            AppError::not_found(format!("{} is not monitored", network.display_name())),
            start,
        )
    })?;

    Ok(Json(ApiResponse::success(
        NetworkStateData::new(network, poll),
        latency(start),
    )))
}

pub async fn summary(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SummaryData>> {
    let start = Instant::now();

    let rows = state
        .monitor
        .all_latest()
        .iter()
        .map(|(network, snapshot)| (*network, SummaryRow::from(snapshot.as_ref())))
        .collect();

    Json(ApiResponse::success(rows, latency(start)))
}

// ============================================
// Developer Activity
// ============================================

pub async fn developers(State(state): State<Arc<AppState>>) -> ApiResult<DevelopersData> {
    let start = Instant::now();

    let poll = state
        .monitor
        .developer_state()
        .ok_or_else(|| error_response(AppError::not_found("Developer activity is disabled"), start))?;

    Ok(Json(ApiResponse::success(DevelopersData::from(poll), latency(start))))
}
