//! Response DTOs for the gateway API
//!
//! Studies, metrics and config serialize directly; these cover the rest.

use serde::Serialize;

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCacheResponse {
    /// Success message
    pub message: String,
    /// Entries dropped by the clear
    pub cleared_studies: usize,
}

impl ClearCacheResponse {
    /// Creates a new ClearCacheResponse
    pub fn new(cleared_studies: usize) -> Self {
        Self {
            message: format!("Cleared {} cached studies", cleared_studies),
            cleared_studies,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
