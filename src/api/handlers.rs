//! API Handlers
//!
//! HTTP request handlers exposing the cache service to the portal.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::Metrics;
use crate::config::{CacheConfig, PartialCacheConfig};
use crate::error::Result;
use crate::models::{ClearCacheResponse, HealthResponse, ImagingStudy, StudyQuery};
use crate::service::ImagingCacheService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache service handle
    pub service: ImagingCacheService,
}

impl AppState {
    /// Creates a new AppState around the given service.
    pub fn new(service: ImagingCacheService) -> Self {
        Self { service }
    }
}

/// Handler for GET /studies/:study_id?patientId=
///
/// Returns the study from cache or the remote imaging API.
pub async fn get_study_handler(
    State(state): State<AppState>,
    Path(study_id): Path<String>,
    Query(query): Query<StudyQuery>,
) -> Result<Json<ImagingStudy>> {
    let study = state
        .service
        .get_study(&study_id, &query.patient_id)
        .await?;
    Ok(Json(study))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.service.clear_cache().await;
    Json(ClearCacheResponse::new(cleared))
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Json<Metrics> {
    Json(state.service.get_metrics().await)
}

/// Handler for GET /config
pub async fn get_config_handler(State(state): State<AppState>) -> Json<CacheConfig> {
    Json(state.service.get_config())
}

/// Handler for PUT /config
///
/// Applies a partial configuration; omitted fields keep their current values.
pub async fn update_config_handler(
    State(state): State<AppState>,
    Json(partial): Json<PartialCacheConfig>,
) -> Json<CacheConfig> {
    Json(state.service.update_config(partial).await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
