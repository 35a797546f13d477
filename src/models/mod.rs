//! Data model: the cached study payload plus the gateway's request and
//! response bodies.

pub mod requests;
pub mod responses;
pub mod study;

// Re-export commonly used types
pub use requests::StudyQuery;
pub use responses::{ClearCacheResponse, HealthResponse};
pub use study::{decode_study, ImagingStudy, ENTRY_OVERHEAD_BYTES};
