//! Shared HTTP plumbing for upstream clients

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{HTTP_CLIENT_TIMEOUT_SECS, USER_AGENT as USER_AGENT_CONST};

/// Build an HTTP client with User-Agent, JSON accept and gzip enabled
pub fn build_client() -> AppResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(HTTP_CLIENT_TIMEOUT_SECS))
        .gzip(true)
        .build()
        .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))
}

/// Send a prepared request and decode a JSON body, mapping status errors
pub async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder, label: &str) -> AppResult<T> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::http_status(status, label));
    }

    let body = response.bytes().await?;
    debug!("📥 {} returned {} bytes", label, body.len());
    serde_json::from_slice(&body)
        .map_err(|e| AppError::invalid_response(format!("{}: unexpected response shape: {}", label, e)))
}

/// Parse a decimal string the way upstream APIs encode numbers ("0.51", "12")
pub fn parse_decimal(raw: &str, what: &str) -> AppResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::invalid_response(format!("{} is not a number: {:?}", what, raw)))
}
