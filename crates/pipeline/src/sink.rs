//! In-memory transaction sink
//!
//! Default [`TransactionSink`]: accepted transactions are kept in memory
//! with no persistence across restarts. Production deployments substitute
//! their own sink implementation at the same trait seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use sms_txn_core::{CandidateTransaction, SinkError, TransactionSink};

/// One stored row: the candidate plus the dedup hash it was admitted under.
#[derive(Debug, Clone)]
pub struct StoredTransaction {
    pub transaction: CandidateTransaction,
    pub dedup_hash: String,
    pub stored_at: DateTime<Utc>,
}

/// In-memory sink (default)
#[derive(Default)]
pub struct InMemorySink {
    records: RwLock<Vec<StoredTransaction>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of everything stored so far, in insertion order.
    pub fn transactions(&self) -> Vec<StoredTransaction> {
        self.records.read().clone()
    }
}

#[async_trait]
impl TransactionSink for InMemorySink {
    async fn store(
        &self,
        txn: &CandidateTransaction,
        dedup_hash: &str,
    ) -> Result<(), SinkError> {
        self.records.write().push(StoredTransaction {
            transaction: txn.clone(),
            dedup_hash: dedup_hash.to_string(),
            stored_at: Utc::now(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
