//! Request DTOs for the gateway API

use serde::Deserialize;

/// Query string for `GET /studies/:study_id`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyQuery {
    /// Owner of the requested study
    #[serde(default)]
    pub patient_id: String,
}
