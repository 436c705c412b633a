//! Per-item error taxonomy for the extraction pipeline

use thiserror::Error;

use crate::classification::MessageClass;
use crate::outcome::DedupMethod;

/// Typed outcome for a message that did not produce an accepted transaction.
///
/// These are expected per-item results: they are recorded in job logs and
/// surfaced to callers with their reason strings, never propagated as
/// failures across the batch orchestrator boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    /// Pre-filter could not decide what the message is
    #[error("classification unknown: {reason}")]
    ClassificationUnknown { reason: String },

    /// Message is something other than a real transaction (promo, OTP, spam)
    #[error("classified as {class}: {reason}")]
    ClassifiedNonTransaction { class: MessageClass, reason: String },

    /// Fast tier found no currency amount
    #[error("no currency amount found in message")]
    AmountNotFound,

    /// Fast tier found no vendor/merchant
    #[error("no vendor found in message")]
    VendorNotFound,

    /// Rich-tier oracle did not answer within the deadline
    #[error("oracle timed out after {elapsed_ms}ms")]
    OracleTimeout { elapsed_ms: u64 },

    /// Rich-tier oracle failed outright
    #[error("oracle unavailable: {message}")]
    OracleUnavailable { message: String },

    /// Result did not clear the acceptance floor
    #[error("confidence {confidence:.2} below acceptance floor {floor:.2}")]
    LowConfidence { confidence: f32, floor: f32 },

    /// Deduplicator identified the candidate as already recorded
    #[error("duplicate transaction ({method}): {reason}")]
    Duplicate { method: DedupMethod, reason: String },

    /// Both tiers ran and neither produced a usable result
    #[error("escalation failed: {reason}")]
    EscalationFailed { reason: String },
}

impl ExtractError {
    /// Stable machine-readable code for job logs and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            ExtractError::ClassificationUnknown { .. } => "classification_unknown",
            ExtractError::ClassifiedNonTransaction { .. } => "non_transaction",
            ExtractError::AmountNotFound => "amount_not_found",
            ExtractError::VendorNotFound => "vendor_not_found",
            ExtractError::OracleTimeout { .. } => "oracle_timeout",
            ExtractError::OracleUnavailable { .. } => "oracle_unavailable",
            ExtractError::LowConfidence { .. } => "low_confidence",
            ExtractError::Duplicate { .. } => "duplicate",
            ExtractError::EscalationFailed { .. } => "escalation_failed",
        }
    }

    /// Field-level fast-tier misses escalate to the rich tier instead of
    /// failing the message outright.
    pub fn triggers_escalation(&self) -> bool {
        matches!(self, ExtractError::AmountNotFound | ExtractError::VendorNotFound)
    }
}
