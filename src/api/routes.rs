//! API Routes
//!
//! Configures the Axum router for the imaging cache gateway.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, get_config_handler, get_study_handler, health_handler,
    metrics_handler, update_config_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /studies/:study_id?patientId=` - Look up a study
/// - `DELETE /cache` - Drop all cached studies
/// - `GET /metrics` - Hit/request counters
/// - `GET /config` / `PUT /config` - Read or adjust cache tuning
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (the portal UI is served separately)
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/studies/:study_id", get(get_study_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/metrics", get(metrics_handler))
        .route("/config", get(get_config_handler).put(update_config_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
