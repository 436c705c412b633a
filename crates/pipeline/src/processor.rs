//! Single-message pipeline
//!
//! Runs one message through the full chain: pre-filter gate, channel
//! routing, tiered extraction, dedup admission, storage. Every stage's
//! rejection becomes a typed [`ExtractError`] so batch jobs can log the
//! precise reason an auditor needs.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use sms_txn_classifier::{route, PreFilter};
use sms_txn_config::{SenderRegistry, Settings};
use sms_txn_core::{
    CandidateTransaction, Classification, ExtractError, MessageClass, SinkError, SmsMessage,
    TransactionSink,
};
use sms_txn_dedup::{DedupDecision, DedupEngine};
use sms_txn_oracle::TransactionOracle;

use crate::escalation::{EscalationController, EscalationStats};

/// Failure of one message.
///
/// `Item` is an expected per-item rejection; `Storage` is a sink fault.
/// Batch orchestration treats the two differently: items never fail a job,
/// an unavailable sink does.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Item(#[from] ExtractError),

    #[error(transparent)]
    Storage(#[from] SinkError),
}

/// A message that made it all the way to storage.
#[derive(Debug, Clone)]
pub struct AcceptedTransaction {
    /// Pre-filter verdict that admitted the message
    pub classification: Classification,
    pub transaction: CandidateTransaction,
    /// Content hash the dedup buffer admitted the candidate under
    pub dedup_hash: String,
    /// Whether the rich tier was consulted
    pub escalated: bool,
}

/// The full per-message chain, shared by the parse endpoint and all batch
/// workers. Stateless apart from the dedup buffer and escalation stats.
pub struct MessagePipeline {
    prefilter: PreFilter,
    escalation: EscalationController,
    dedup: DedupEngine,
    sink: Arc<dyn TransactionSink>,
    accept_threshold: f32,
}

impl MessagePipeline {
    pub fn new(
        settings: &Settings,
        oracle: Arc<dyn TransactionOracle>,
        sink: Arc<dyn TransactionSink>,
    ) -> Self {
        Self {
            prefilter: PreFilter::new(settings.prefilter.clone(), SenderRegistry::builtin()),
            escalation: EscalationController::new(oracle, settings.escalation.clone()),
            dedup: DedupEngine::new(settings.dedup.clone()),
            sink,
            accept_threshold: settings.prefilter.accept_threshold,
        }
    }

    /// Process one message end to end.
    pub async fn process(&self, message: &SmsMessage) -> Result<AcceptedTransaction, ProcessError> {
        let classification = self.prefilter.classify(message);

        if classification.class == MessageClass::Unknown {
            return Err(ExtractError::ClassificationUnknown {
                reason: classification.reason,
            }
            .into());
        }
        if classification.class != MessageClass::RealTransaction {
            return Err(ExtractError::ClassifiedNonTransaction {
                class: classification.class,
                reason: classification.reason,
            }
            .into());
        }
        if !self.prefilter.should_extract(&classification) {
            return Err(ExtractError::LowConfidence {
                confidence: classification.confidence,
                floor: self.accept_threshold,
            }
            .into());
        }

        let channel = route(&message.text);
        let now = Utc::now();
        let result = self.escalation.extract(message, channel, now).await?;

        match self.dedup.check_and_insert(&result.candidate, now) {
            DedupDecision::Accepted { hash } => {
                self.sink.store(&result.candidate, &hash).await?;
                info!(
                    vendor = %result.candidate.vendor,
                    amount = result.candidate.amount,
                    channel = result.candidate.channel.as_str(),
                    tier = result.candidate.tier.as_str(),
                    escalated = result.escalated,
                    sink = self.sink.name(),
                    "transaction accepted"
                );
                Ok(AcceptedTransaction {
                    classification,
                    transaction: result.candidate,
                    dedup_hash: hash,
                    escalated: result.escalated,
                })
            }
            DedupDecision::Duplicate(found) => {
                debug!(
                    method = found.method.as_str(),
                    vendor = %result.candidate.vendor,
                    "duplicate dropped"
                );
                Err(ExtractError::Duplicate {
                    method: found.method,
                    reason: found.reason,
                }
                .into())
            }
        }
    }

    /// Tier routing statistics, for readiness output.
    pub fn escalation_stats(&self) -> EscalationStats {
        self.escalation.stats()
    }

    /// Current dedup buffer size.
    pub fn dedup_len(&self) -> usize {
        self.dedup.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::InMemorySink;
    use sms_txn_core::DedupMethod;
    use sms_txn_oracle::NullOracle;

    const UPI_DEBIT: &str =
        "Rs.499.00 debited from your A/c XX1234 via UPI to SWIGGY. UPI Ref no 423456789012.";

    fn pipeline(sink: Arc<InMemorySink>) -> MessagePipeline {
        MessagePipeline::new(&Settings::default(), Arc::new(NullOracle), sink)
    }

    #[tokio::test]
    async fn real_transaction_reaches_the_sink() {
        let sink = Arc::new(InMemorySink::new());
        let pipeline = pipeline(sink.clone());

        let accepted = pipeline
            .process(&SmsMessage::new(UPI_DEBIT).with_sender("VM-HDFCBK"))
            .await
            .unwrap();

        assert_eq!(accepted.classification.class, MessageClass::RealTransaction);
        assert_eq!(accepted.transaction.vendor, "SWIGGY");
        assert!(!accepted.escalated);
        assert!(!accepted.dedup_hash.is_empty());
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.transactions()[0].dedup_hash, accepted.dedup_hash);
    }

    #[tokio::test]
    async fn same_message_twice_is_a_duplicate() {
        let sink = Arc::new(InMemorySink::new());
        let pipeline = pipeline(sink.clone());
        let message = SmsMessage::new(UPI_DEBIT);

        pipeline.process(&message).await.unwrap();
        let err = pipeline.process(&message).await.unwrap_err();

        match err {
            ProcessError::Item(ExtractError::Duplicate { method, .. }) => {
                assert_eq!(method, DedupMethod::Reference);
            }
            other => panic!("expected duplicate, got {:?}", other),
        }
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn promotional_message_is_rejected_before_extraction() {
        let pipeline = pipeline(Arc::new(InMemorySink::new()));

        let err = pipeline
            .process(&SmsMessage::new(
                "Flat 50% off on orders above Rs.199. Use code TASTY50. Hurry!",
            ))
            .await
            .unwrap_err();

        match err {
            ProcessError::Item(ExtractError::ClassifiedNonTransaction { class, .. }) => {
                assert_eq!(class, MessageClass::Promotional);
            }
            other => panic!("expected non-transaction rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn undecidable_message_is_rejected_as_unknown() {
        let pipeline = pipeline(Arc::new(InMemorySink::new()));

        let err = pipeline
            .process(&SmsMessage::new("hello how are you"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProcessError::Item(ExtractError::ClassificationUnknown { .. })
        ));
    }

    #[tokio::test]
    async fn weak_transaction_signal_fails_the_gate() {
        let pipeline = pipeline(Arc::new(InMemorySink::new()));

        // Scores as a real transaction, but too weakly to clear the gate.
        let err = pipeline
            .process(&SmsMessage::new("You sent money. Balance Rs.120 remains."))
            .await
            .unwrap_err();

        match err {
            ProcessError::Item(ExtractError::LowConfidence { confidence, floor }) => {
                assert!(confidence <= floor);
                assert!((floor - 0.6).abs() < 1e-4);
            }
            other => panic!("expected low-confidence rejection, got {:?}", other),
        }
    }
}
