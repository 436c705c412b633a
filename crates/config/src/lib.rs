//! Configuration management for the SMS transaction pipeline
//!
//! Two layers:
//! - [`Settings`]: runtime configuration loaded from `config/default.yaml`,
//!   an optional `config/{env}.yaml` overlay, and `SMS_TXN__*` environment
//!   variables, validated at startup.
//! - [`SenderRegistry`]: the financial-institution sender set used by the
//!   pre-filter boost, built in with a YAML override hook.

pub mod senders;
pub mod settings;

pub use senders::SenderRegistry;
pub use settings::{
    load_settings, BatchConfig, DedupConfig, EscalationConfig, ObservabilityConfig,
    OracleConfig, PrefilterConfig, RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
