//! Storage collaborator boundary

use async_trait::async_trait;
use thiserror::Error;

use crate::transaction::CandidateTransaction;

/// Storage-side failures.
///
/// `Unavailable` is an orchestrator-level fault: the batch driver stops
/// dispatching and fails the job. `WriteFailed` counts as a per-item failure
/// only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("write failed: {message}")]
    WriteFailed { message: String },
}

/// Destination for accepted transactions.
///
/// The pipeline's responsibility ends when `store` returns Ok; persistence
/// semantics beyond that point belong to the implementation.
#[async_trait]
pub trait TransactionSink: Send + Sync {
    /// Persist an accepted candidate together with its dedup hash.
    async fn store(&self, txn: &CandidateTransaction, dedup_hash: &str) -> Result<(), SinkError>;

    /// Implementation name for logs.
    fn name(&self) -> &str;
}
