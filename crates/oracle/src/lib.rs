//! Rich-tier oracle clients
//!
//! The rich extraction tier consults an external prediction service:
//! - `backend`: the oracle contract and the disabled-mode stub
//! - `http`: production client with timeout, retry, and exponential backoff
//!
//! Oracles are only ever called from the escalation controller, which wraps
//! every call in its own deadline.

pub mod backend;
pub mod http;

pub use backend::{NullOracle, OraclePrediction, TransactionOracle};
pub use http::HttpOracle;

use thiserror::Error;

/// Oracle call errors
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("api error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("oracle disabled")]
    Disabled,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Timeout
        } else {
            OracleError::Network(err.to_string())
        }
    }
}
