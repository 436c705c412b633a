//! Application state
//!
//! Shared state across all handlers.

use std::sync::Arc;

use sms_txn_config::Settings;
use sms_txn_core::TransactionSink;
use sms_txn_oracle::{HttpOracle, NullOracle, TransactionOracle};
use sms_txn_pipeline::{BatchOrchestrator, InMemorySink, JobManager, MessagePipeline};

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration
    pub config: Arc<Settings>,
    /// Single-message pipeline
    pub pipeline: Arc<MessagePipeline>,
    /// Batch driver
    pub orchestrator: Arc<BatchOrchestrator>,
    /// Job registry
    pub jobs: Arc<JobManager>,
    /// Rich-tier oracle, probed by the readiness check
    pub oracle: Arc<dyn TransactionOracle>,
}

impl AppState {
    /// Build state from settings, selecting the oracle per config.
    pub fn new(config: Settings) -> Result<Self, ServerError> {
        let oracle: Arc<dyn TransactionOracle> = if config.oracle.enabled {
            let oracle = HttpOracle::new(config.oracle.clone())
                .map_err(|e| ServerError::Configuration(e.to_string()))?;
            Arc::new(oracle)
        } else {
            tracing::info!("oracle disabled, pipeline runs fast tier only");
            Arc::new(NullOracle)
        };
        Ok(Self::with_oracle(config, oracle))
    }

    /// Build state with a caller-supplied oracle and the in-memory sink.
    pub fn with_oracle(config: Settings, oracle: Arc<dyn TransactionOracle>) -> Self {
        Self::with_collaborators(config, oracle, Arc::new(InMemorySink::new()))
    }

    /// Build state with caller-supplied oracle and sink.
    pub fn with_collaborators(
        config: Settings,
        oracle: Arc<dyn TransactionOracle>,
        sink: Arc<dyn TransactionSink>,
    ) -> Self {
        let pipeline = Arc::new(MessagePipeline::new(&config, oracle.clone(), sink));
        let orchestrator = Arc::new(BatchOrchestrator::new(pipeline.clone(), config.batch.clone()));
        let jobs = Arc::new(JobManager::new(&config.batch));
        Self {
            config: Arc::new(config),
            pipeline,
            orchestrator,
            jobs,
            oracle,
        }
    }
}
