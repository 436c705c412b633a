//! SMS Transaction Server
//!
//! HTTP surface for single-message parsing, batch submission, and job
//! tracking.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{
    init_metrics, metrics_handler, record_batch_submitted, record_duplicate, record_error,
    record_extraction, record_job_settled, record_parse_latency, record_parse_outcome,
    record_request,
};
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Job not found: {0}")]
    JobNotFound(uuid::Uuid),

    #[error("Job registry full")]
    TooManyJobs,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::JobNotFound(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::TooManyJobs => axum::http::StatusCode::TOO_MANY_REQUESTS,
            ServerError::Configuration(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::StorageUnavailable(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
