//! API Module
//!
//! HTTP gateway in front of the imaging cache service.
//!
//! # Endpoints
//! - `GET /studies/:study_id?patientId=` - Look up a study
//! - `DELETE /cache` - Clear the cache
//! - `GET /metrics` - Cache metrics
//! - `GET /config`, `PUT /config` - Cache configuration
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
