//! Centralized Error Handling Module
//!
//! Every failure carries a unique code so degraded fields can be traced
//! back to the upstream that caused them.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - UPSTREAM_xxx / RPC_xxx: upstream call failures
//! - INVALID_RESPONSE / MISSING_VALUE: schema validation failures
//! - CFG_xxx: configuration errors
//! - API_xxx: snapshot API errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Same code and message, without the source (for fanning one failure
    /// out to several fields)
    pub fn detached(&self) -> Self {
        Self::new(self.code, self.message.clone())
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Upstream Errors (1xx)
    // ============================================
    /// Call exceeded the per-branch timeout
    UpstreamTimeout,
    /// Non-2xx HTTP status
    UpstreamHttp,
    /// HTTP 429
    UpstreamRateLimited,
    /// TCP/TLS connection failed
    UpstreamConnectionFailed,
    /// JSON-RPC error object in response
    RpcError,
    /// Every configured endpoint failed
    RpcNoEndpoints,

    // ============================================
    // Validation Errors (2xx)
    // ============================================
    /// Response body did not match the expected schema
    InvalidResponse,
    /// Response parsed but the wanted value is absent or unusable
    MissingValue,
    /// Chain source does not provide this metric
    UnsupportedMetric,

    // ============================================
    // API Errors (3xx)
    // ============================================
    ApiBadRequest,
    ApiNotFound,
    ApiRateLimited,
    ApiInternalError,

    // ============================================
    // Configuration Errors (4xx)
    // ============================================
    ConfigInvalidValue,
    ConfigUnknownNetwork,

    // ============================================
    // Generic Errors (9xx)
    // ============================================
    /// Fetch task panicked outside per-branch isolation
    FetchPanicked,
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::UpstreamHttp => "UPSTREAM_HTTP",
            Self::UpstreamRateLimited => "UPSTREAM_RATE_LIMITED",
            Self::UpstreamConnectionFailed => "UPSTREAM_CONNECTION_FAILED",
            Self::RpcError => "RPC_ERROR",
            Self::RpcNoEndpoints => "RPC_NO_ENDPOINTS",

            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::MissingValue => "MISSING_VALUE",
            Self::UnsupportedMetric => "UNSUPPORTED_METRIC",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigUnknownNetwork => "CFG_UNKNOWN_NETWORK",

            Self::FetchPanicked => "FETCH_PANICKED",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ConfigInvalidValue => 400,
            Self::ApiNotFound | Self::ConfigUnknownNetwork => 404,
            Self::ApiRateLimited | Self::UpstreamRateLimited => 429,
            Self::UpstreamTimeout => 504,
            Self::UpstreamHttp | Self::UpstreamConnectionFailed | Self::RpcNoEndpoints => 502,
            _ => 500,
        }
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn timeout(what: impl fmt::Display, after_ms: u128) -> Self {
        Self::new(
            ErrorCode::UpstreamTimeout,
            format!("{} timed out after {}ms", what, after_ms),
        )
    }

    pub fn http_status(status: reqwest::StatusCode, url: &str) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::new(ErrorCode::UpstreamRateLimited, format!("Rate limited (HTTP 429) by {}", url))
        } else {
            Self::new(ErrorCode::UpstreamHttp, format!("HTTP {} from {}", status, url))
        }
    }

    pub fn rpc(code: i64, message: impl fmt::Display) -> Self {
        Self::new(ErrorCode::RpcError, format!("RPC error: {} (code: {})", message, code))
    }

    pub fn no_endpoints(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcNoEndpoints, msg)
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidResponse, msg)
    }

    pub fn missing(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingValue, msg)
    }

    pub fn unsupported(metric: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedMetric,
            format!("{} is not provided by this chain source", metric),
        )
    }

    pub fn unknown_network(name: &str) -> Self {
        Self::new(ErrorCode::ConfigUnknownNetwork, format!("Unknown network: {}", name))
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    pub fn panicked(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::FetchPanicked, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiNotFound, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::with_source(ErrorCode::UpstreamTimeout, "Request timeout", err)
        } else if err.is_connect() {
            Self::with_source(ErrorCode::UpstreamConnectionFailed, "Connection failed", err)
        } else if err.is_decode() {
            Self::with_source(ErrorCode::InvalidResponse, "Failed to decode response body", err)
        } else if let Some(status) = err.status() {
            Self::new(ErrorCode::UpstreamHttp, format!("HTTP {}", status))
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::InvalidResponse, "JSON parse error", err)
    }
}
