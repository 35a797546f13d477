//! Error types for the imaging cache
//!
//! Every failure a caller of `get_study` can see carries a stable, machine-readable
//! [`ErrorKind`] alongside its human-readable message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// == Error Kind ==
/// Stable classification of an [`ImagingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ApiRequestFailed,
    NetworkError,
    InvalidJson,
    InvalidResponseFormat,
    MissingStudyData,
    InvalidRequest,
}

impl ErrorKind {
    /// Returns the wire code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ApiRequestFailed => "API_REQUEST_FAILED",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::InvalidJson => "INVALID_JSON",
            ErrorKind::InvalidResponseFormat => "INVALID_RESPONSE_FORMAT",
            ErrorKind::MissingStudyData => "MISSING_STUDY_DATA",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// == Imaging Error Enum ==
/// Unified error type for study lookups.
///
/// `Clone` so a single in-flight fetch can hand its outcome to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImagingError {
    /// Upstream answered with a non-success status
    #[error("API request failed: {status} {reason}")]
    ApiRequestFailed { status: u16, reason: String },

    /// Transport failure that persisted across every attempt
    #[error("Network error after {attempts} attempt(s): {reason}")]
    Network { attempts: u32, reason: String },

    /// Response body was not valid JSON
    #[error("Invalid JSON in response: {0}")]
    InvalidJson(String),

    /// Response body parsed, but not to a JSON object
    #[error("Invalid response format: {0}")]
    InvalidResponseFormat(String),

    /// Response object lacked required study fields
    #[error("Missing study data: {0}")]
    MissingStudyData(String),

    /// Caller supplied an unusable identifier
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ImagingError {
    /// Returns the stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImagingError::ApiRequestFailed { .. } => ErrorKind::ApiRequestFailed,
            ImagingError::Network { .. } => ErrorKind::NetworkError,
            ImagingError::InvalidJson(_) => ErrorKind::InvalidJson,
            ImagingError::InvalidResponseFormat(_) => ErrorKind::InvalidResponseFormat,
            ImagingError::MissingStudyData(_) => ErrorKind::MissingStudyData,
            ImagingError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ImagingError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::ApiRequestFailed
            | ErrorKind::NetworkError
            | ErrorKind::InvalidJson
            | ErrorKind::InvalidResponseFormat
            | ErrorKind::MissingStudyData => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind().code(),
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the imaging cache.
pub type Result<T> = std::result::Result<T, ImagingError>;
