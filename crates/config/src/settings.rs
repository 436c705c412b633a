//! Runtime settings
//!
//! Loaded via the `config` crate with the usual layering:
//! environment variables (`SMS_TXN__SECTION__FIELD`) over
//! `config/{env}.yaml` over `config/default.yaml` over compiled defaults.
//! Every section carries serde defaults so a missing file still yields a
//! usable configuration, and `validate()` rejects out-of-range values at
//! startup rather than at first use.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeEnvironment::Production)
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub prefilter: PrefilterConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate every section; first offending field wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.prefilter.validate()?;
        self.escalation.validate()?;
        self.dedup.validate()?;
        self.batch.validate()?;
        self.oracle.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

/// HTTP server binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on messages per batch submission
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_batch_size() -> usize {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.host".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_batch_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Pre-filter thresholds (hand-tuned defaults, kept configurable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefilterConfig {
    /// Extraction proceeds only above this confidence
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f32,
    /// Below this max score the message is classified Unknown
    #[serde(default = "default_unknown_floor")]
    pub unknown_floor: f32,
    /// Confidence assigned on a strong-pattern short circuit
    #[serde(default = "default_strong_pattern_confidence")]
    pub strong_pattern_confidence: f32,
    /// Boost applied when the sender is a known financial institution
    #[serde(default = "default_sender_boost")]
    pub sender_boost: f32,
}

fn default_accept_threshold() -> f32 {
    0.6
}
fn default_unknown_floor() -> f32 {
    0.3
}
fn default_strong_pattern_confidence() -> f32 {
    0.95
}
fn default_sender_boost() -> f32 {
    0.2
}

impl Default for PrefilterConfig {
    fn default() -> Self {
        Self {
            accept_threshold: default_accept_threshold(),
            unknown_floor: default_unknown_floor(),
            strong_pattern_confidence: default_strong_pattern_confidence(),
            sender_boost: default_sender_boost(),
        }
    }
}

impl PrefilterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("prefilter.accept_threshold", self.accept_threshold),
            ("prefilter.unknown_floor", self.unknown_floor),
            (
                "prefilter.strong_pattern_confidence",
                self.strong_pattern_confidence,
            ),
            ("prefilter.sender_boost", self.sender_boost),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if self.accept_threshold < self.unknown_floor {
            return Err(ConfigError::InvalidValue {
                field: "prefilter.accept_threshold".to_string(),
                message: "must not be below prefilter.unknown_floor".to_string(),
            });
        }
        Ok(())
    }
}

/// Two-tier escalation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Fast-tier confidence below this escalates to the oracle
    #[serde(default = "default_escalation_threshold")]
    pub escalation_threshold: f32,
    /// Hard floor: results below this are rejected as low confidence
    #[serde(default = "default_acceptance_floor")]
    pub acceptance_floor: f32,
    /// Deadline for one oracle call
    #[serde(default = "default_oracle_timeout_ms")]
    pub oracle_timeout_ms: u64,
    /// On oracle failure, accept the fast result if one exists
    #[serde(default = "default_fallback_to_fast")]
    pub fallback_to_fast: bool,
}

fn default_escalation_threshold() -> f32 {
    0.7
}
fn default_acceptance_floor() -> f32 {
    0.7
}
fn default_oracle_timeout_ms() -> u64 {
    8_000
}
fn default_fallback_to_fast() -> bool {
    true
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: default_escalation_threshold(),
            acceptance_floor: default_acceptance_floor(),
            oracle_timeout_ms: default_oracle_timeout_ms(),
            fallback_to_fast: default_fallback_to_fast(),
        }
    }
}

impl EscalationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("escalation.escalation_threshold", self.escalation_threshold),
            ("escalation.acceptance_floor", self.acceptance_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if self.oracle_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "escalation.oracle_timeout_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Dedup buffer bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Ring buffer capacity; oldest records evicted first
    #[serde(default = "default_dedup_capacity")]
    pub capacity: usize,
    /// Records older than this are purged
    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,
    /// Window for the fuzzy similarity check
    #[serde(default = "default_similarity_window_secs")]
    pub similarity_window_secs: i64,
    /// Amount tolerance for the similarity check
    #[serde(default = "default_amount_epsilon")]
    pub amount_epsilon: f64,
}

fn default_dedup_capacity() -> usize {
    1_000
}
fn default_retention_hours() -> i64 {
    24
}
fn default_similarity_window_secs() -> i64 {
    3_600
}
fn default_amount_epsilon() -> f64 {
    0.01
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            capacity: default_dedup_capacity(),
            retention_hours: default_retention_hours(),
            similarity_window_secs: default_similarity_window_secs(),
            amount_epsilon: default_amount_epsilon(),
        }
    }
}

impl DedupConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dedup.capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.retention_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "dedup.retention_hours".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.similarity_window_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "dedup.similarity_window_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.amount_epsilon < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "dedup.amount_epsilon".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Batch orchestration knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Bounded worker pool width; the rich tier is the bottleneck, keep small
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Items dispatched per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Pause between chunks, protects a rate-limited oracle
    #[serde(default)]
    pub chunk_delay_ms: u64,
    /// Trailing per-item outcome log kept per job
    #[serde(default = "default_item_log_capacity")]
    pub item_log_capacity: usize,
    /// Active + retained terminal jobs allowed in the table
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    /// Terminal jobs older than this are evicted
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,
}

fn default_workers() -> usize {
    3
}
fn default_chunk_size() -> usize {
    10
}
fn default_item_log_capacity() -> usize {
    50
}
fn default_max_jobs() -> usize {
    100
}
fn default_job_retention_secs() -> u64 {
    3_600
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            chunk_size: default_chunk_size(),
            chunk_delay_ms: 0,
            item_log_capacity: default_item_log_capacity(),
            max_jobs: default_max_jobs(),
            job_retention_secs: default_job_retention_secs(),
        }
    }
}

impl BatchConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > 64 {
            return Err(ConfigError::InvalidValue {
                field: "batch.workers".to_string(),
                message: "must be between 1 and 64".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch.chunk_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.item_log_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch.item_log_capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_jobs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch.max_jobs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Rich-tier oracle endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// When false the pipeline runs fast-tier only
    #[serde(default = "default_oracle_enabled")]
    pub enabled: bool,
    #[serde(default = "default_oracle_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_oracle_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Client-level request timeout (the escalation deadline is separate)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_oracle_enabled() -> bool {
    true
}
fn default_oracle_endpoint() -> String {
    "http://localhost:8191/v1/extract".to_string()
}
fn default_oracle_model() -> String {
    "txn-extract-v2".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_max_retries() -> u32 {
    2
}
fn default_initial_backoff_ms() -> u64 {
    200
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: default_oracle_enabled(),
            endpoint: default_oracle_endpoint(),
            model: default_oracle_model(),
            api_key: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl OracleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "oracle.endpoint".to_string(),
                message: format!("'{}' is not an http(s) URL", self.endpoint),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "oracle.request_timeout_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.max_retries > 10 {
            return Err(ConfigError::InvalidValue {
                field: "oracle.max_retries".to_string(),
                message: "must not exceed 10".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_metrics_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ObservabilityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "observability.log_level".to_string(),
                message: format!("'{}' is not one of {:?}", self.log_level, LEVELS),
            });
        }
        Ok(())
    }
}

/// Load settings from files and environment.
///
/// Priority: env vars > `config/{env}.yaml` > `config/default.yaml` > defaults.
/// Missing files are fine; invalid values are not.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder =
        Config::builder().add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("SMS_TXN")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.prefilter.accept_threshold, 0.6);
        assert_eq!(settings.escalation.escalation_threshold, 0.7);
        assert_eq!(settings.escalation.acceptance_floor, 0.7);
        assert_eq!(settings.dedup.capacity, 1_000);
        assert_eq!(settings.dedup.retention_hours, 24);
        assert_eq!(settings.batch.workers, 3);
        assert!(!settings.environment.is_production());
    }

    #[test]
    fn threshold_outside_unit_interval_is_rejected() {
        let mut settings = Settings::default();
        settings.prefilter.accept_threshold = 1.3;
        let err = settings.validate().unwrap_err();
        match err {
            ConfigError::InvalidValue { field, .. } => {
                assert_eq!(field, "prefilter.accept_threshold")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accept_threshold_below_unknown_floor_is_rejected() {
        let mut settings = Settings::default();
        settings.prefilter.accept_threshold = 0.2;
        settings.prefilter.unknown_floor = 0.3;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let mut settings = Settings::default();
        settings.batch.workers = 0;
        assert!(settings.validate().is_err());
        settings.batch.workers = 65;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn disabled_oracle_skips_endpoint_validation() {
        let mut settings = Settings::default();
        settings.oracle.enabled = false;
        settings.oracle.endpoint = "not-a-url".to_string();
        assert!(settings.validate().is_ok());

        settings.oracle.enabled = true;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut settings = Settings::default();
        settings.observability.log_level = "verbose".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_yaml_overlays_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "environment: production\nbatch:\n  workers: 5\n  chunk_delay_ms: 250"
        )
        .unwrap();

        let config = Config::builder()
            .add_source(File::from(file.path()))
            .build()
            .unwrap();
        let settings: Settings = config.try_deserialize().unwrap();

        assert!(settings.environment.is_production());
        assert_eq!(settings.batch.workers, 5);
        assert_eq!(settings.batch.chunk_delay_ms, 250);
        // Untouched sections keep their defaults.
        assert_eq!(settings.prefilter.accept_threshold, 0.6);
        assert_eq!(settings.batch.chunk_size, 10);
    }
}
