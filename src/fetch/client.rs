//! Remote fetch and credential collaborators.
//!
//! The service only sees the [`StudyFetcher`] and [`TokenProvider`] traits.
//! [`HttpStudyFetcher`] is the reqwest-backed implementation used by the binary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

// == Raw Response ==
/// An upstream reply that arrived in full, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Reason phrase for `status`, e.g. "Not Found"
    pub status_text: String,
    pub body: String,
}

impl RawResponse {
    /// Builds a 200 response carrying `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// == Transport Error ==
/// The call did not complete (connect failure, timeout, dropped body).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

// == Study Fetcher ==
/// Performs one remote fetch attempt for a study.
#[async_trait]
pub trait StudyFetcher: Send + Sync {
    /// Fetches `study_id` on behalf of `patient_id`, authenticated with `bearer_token`.
    ///
    /// Returns `Err` only when no response was received.
    async fn fetch_study(
        &self,
        study_id: &str,
        patient_id: &str,
        bearer_token: &str,
    ) -> Result<RawResponse, TransportError>;
}

// == Token Provider ==
/// Supplies the bearer credential current at call time.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> String;
}

/// A fixed token, e.g. read from the environment at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider(String);

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticTokenProvider {
    fn bearer_token(&self) -> String {
        self.0.clone()
    }
}

// == HTTP Study Fetcher ==
/// Fetches studies from `GET {base}/api/imaging/studies/{studyId}`.
#[derive(Debug, Clone)]
pub struct HttpStudyFetcher {
    client: Client,
    base_url: Url,
}

impl HttpStudyFetcher {
    /// Creates a fetcher for `base_url` with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError(format!("invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError(format!("invalid base URL {}", base_url)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Endpoint for one study, with the id percent-encoded as a path segment.
    pub fn study_url(&self, study_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "imaging", "studies", study_id]);
        }
        url
    }
}

#[async_trait]
impl StudyFetcher for HttpStudyFetcher {
    async fn fetch_study(
        &self,
        study_id: &str,
        patient_id: &str,
        bearer_token: &str,
    ) -> Result<RawResponse, TransportError> {
        let url = self.study_url(study_id);
        debug!(%url, "requesting study from imaging API");

        let response = self
            .client
            .get(url)
            .query(&[("patientId", patient_id)])
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
