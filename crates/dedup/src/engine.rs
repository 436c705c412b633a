//! Dedup engine and its recent-history buffer

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use sms_txn_config::DedupConfig;
use sms_txn_core::{CandidateTransaction, DedupMethod};
use tracing::debug;

/// One accepted transaction, as remembered for duplicate detection.
#[derive(Debug, Clone)]
pub struct DedupRecord {
    pub hash: String,
    pub external_ref: Option<String>,
    /// Lowercased at insert so the similarity check is case-insensitive
    pub vendor: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub inserted_at: DateTime<Utc>,
}

/// Why a candidate was rejected as a duplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub method: DedupMethod,
    pub reason: String,
}

/// Outcome of one check-and-insert call.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupDecision {
    /// New transaction; the content hash accompanies it to storage.
    Accepted { hash: String },
    Duplicate(DuplicateMatch),
}

impl DedupDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DedupDecision::Accepted { .. })
    }
}

/// Bounded-buffer deduplicator shared by all pipeline workers.
///
/// Eviction (capacity or retention) can in principle forget a transaction
/// that is then re-accepted; that is the documented trade-off against
/// unbounded memory growth.
pub struct DedupEngine {
    config: DedupConfig,
    records: Mutex<VecDeque<DedupRecord>>,
}

impl DedupEngine {
    pub fn new(config: DedupConfig) -> Self {
        let capacity = config.capacity;
        Self {
            config,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Decide REAL vs DUPLICATE and record the candidate if real.
    ///
    /// The whole operation holds the buffer lock so two workers racing on
    /// the same near-duplicate can never both be accepted.
    pub fn check_and_insert(
        &self,
        candidate: &CandidateTransaction,
        now: DateTime<Utc>,
    ) -> DedupDecision {
        let mut records = self.records.lock();

        let cutoff = now - Duration::hours(self.config.retention_hours);
        while records.front().is_some_and(|record| record.inserted_at < cutoff) {
            records.pop_front();
        }

        if let Some(reference) = candidate.external_ref() {
            if records
                .iter()
                .any(|record| record.external_ref.as_deref() == Some(reference))
            {
                debug!(reference, "duplicate by external reference");
                return DedupDecision::Duplicate(DuplicateMatch {
                    method: DedupMethod::Reference,
                    reason: format!("reference {reference} already recorded"),
                });
            }
        }

        let hash = content_hash(&candidate.vendor, candidate.amount, candidate.date);
        if records.iter().any(|record| record.hash == hash) {
            debug!(vendor = %candidate.vendor, amount = candidate.amount, "duplicate by content hash");
            return DedupDecision::Duplicate(DuplicateMatch {
                method: DedupMethod::Hash,
                reason: format!(
                    "same vendor, amount and date already recorded ({} {:.2})",
                    candidate.vendor, candidate.amount
                ),
            });
        }

        let vendor_lower = candidate.vendor.to_lowercase();
        let window = Duration::seconds(self.config.similarity_window_secs);
        let similar = records.iter().find(|record| {
            (record.amount - candidate.amount).abs() <= self.config.amount_epsilon
                && record.vendor == vendor_lower
                && (record.date - candidate.date).abs() <= window
        });
        if let Some(record) = similar {
            let gap = (record.date - candidate.date).num_seconds().abs();
            debug!(vendor = %candidate.vendor, gap_secs = gap, "duplicate by similarity");
            return DedupDecision::Duplicate(DuplicateMatch {
                method: DedupMethod::Similarity,
                reason: format!("near-identical transaction recorded {gap}s apart"),
            });
        }

        if records.len() == self.config.capacity {
            records.pop_front();
        }
        records.push_back(DedupRecord {
            hash: hash.clone(),
            external_ref: candidate.external_ref().map(str::to_string),
            vendor: vendor_lower,
            amount: candidate.amount,
            date: candidate.date,
            inserted_at: now,
        });

        DedupDecision::Accepted { hash }
    }

    /// Records currently buffered, for tests and gauges.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

/// Stable content hash over the identifying triple.
fn content_hash(vendor: &str, amount: f64, date: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{:.2}|{}",
        vendor.to_lowercase(),
        amount,
        date.format("%Y-%m-%d")
    ));
    format!("{:x}", hasher.finalize())
}
