//! Confidence-Gated Escalation
//!
//! Runs the fast tier first and consults the oracle only when the fast
//! result is unusable:
//! - Fast result at or above the escalation threshold: accepted as-is,
//!   the oracle is never called
//! - Fast result below the threshold, or a field-level miss
//!   (`AmountNotFound` / `VendorNotFound`): escalate to the rich tier
//! - Oracle verdict supersedes the fast result entirely, including a
//!   `transactional == false` verdict that rejects the message outright
//! - Oracle infrastructure failure falls back to the fast result when one
//!   exists and `fallback_to_fast` is set; the acceptance floor is not
//!   re-applied to a fallback

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, warn};

use sms_txn_config::EscalationConfig;
use sms_txn_core::{
    CandidateTransaction, ChannelType, ExtractError, ExtractionTier, MessageClass, SmsMessage,
};
use sms_txn_extractor::{date, direction, FastTier};
use sms_txn_oracle::{OracleError, OraclePrediction, TransactionOracle};

/// Result of a tiered extraction
#[derive(Debug, Clone)]
pub struct EscalationResult {
    /// Accepted candidate; `candidate.tier` says which tier produced it
    pub candidate: CandidateTransaction,
    /// Whether the oracle was consulted
    pub escalated: bool,
    /// Confidence of the fast tier's own result, when it produced one
    pub fast_confidence: Option<f32>,
}

/// Statistics for tier routing
#[derive(Debug, Clone, Default, Serialize)]
pub struct EscalationStats {
    pub fast_attempts: usize,
    pub fast_accepts: usize,
    pub escalations: usize,
    pub rich_accepts: usize,
    pub rich_rejections: usize,
    pub fast_fallbacks: usize,
    /// Oracle round trips that returned a prediction
    pub oracle_responses: usize,
    /// Total oracle round-trip time across those responses
    pub rich_latency_ms_total: u64,
}

impl EscalationStats {
    /// Mean oracle round-trip time over responses received so far.
    pub fn avg_rich_latency_ms(&self) -> f64 {
        if self.oracle_responses == 0 {
            0.0
        } else {
            self.rich_latency_ms_total as f64 / self.oracle_responses as f64
        }
    }
}

/// Escalation controller
pub struct EscalationController {
    fast: FastTier,
    oracle: Arc<dyn TransactionOracle>,
    config: EscalationConfig,
    /// Statistics
    stats: Mutex<EscalationStats>,
}

impl EscalationController {
    /// Create a new escalation controller
    pub fn new(oracle: Arc<dyn TransactionOracle>, config: EscalationConfig) -> Self {
        Self {
            fast: FastTier::new(),
            oracle,
            config,
            stats: Mutex::new(EscalationStats::default()),
        }
    }

    /// Extract a candidate from a routed message, escalating when needed.
    pub async fn extract(
        &self,
        message: &SmsMessage,
        channel: ChannelType,
        now: DateTime<Utc>,
    ) -> Result<EscalationResult, ExtractError> {
        self.stats.lock().fast_attempts += 1;

        let fast_candidate = match self.fast.extract(message, channel, now) {
            Ok(candidate) if candidate.confidence >= self.config.escalation_threshold => {
                self.stats.lock().fast_accepts += 1;
                return Ok(EscalationResult {
                    fast_confidence: Some(candidate.confidence),
                    candidate,
                    escalated: false,
                });
            }
            Ok(candidate) => {
                debug!(
                    confidence = candidate.confidence,
                    threshold = self.config.escalation_threshold,
                    "fast result below threshold, escalating"
                );
                Some(candidate)
            }
            Err(ref err) if err.triggers_escalation() => {
                debug!(code = err.code(), "fast tier missed a field, escalating");
                None
            }
            Err(err) => return Err(err),
        };

        self.escalate(message, channel, now, fast_candidate).await
    }

    /// Get statistics
    pub fn stats(&self) -> EscalationStats {
        self.stats.lock().clone()
    }

    async fn escalate(
        &self,
        message: &SmsMessage,
        channel: ChannelType,
        now: DateTime<Utc>,
        fast_candidate: Option<CandidateTransaction>,
    ) -> Result<EscalationResult, ExtractError> {
        self.stats.lock().escalations += 1;

        let deadline = std::time::Duration::from_millis(self.config.oracle_timeout_ms);
        let started = Instant::now();

        match timeout(deadline, self.oracle.predict(&message.text)).await {
            Ok(Ok(prediction)) => {
                {
                    let mut stats = self.stats.lock();
                    stats.oracle_responses += 1;
                    stats.rich_latency_ms_total += started.elapsed().as_millis() as u64;
                }

                if !prediction.transactional {
                    self.stats.lock().rich_rejections += 1;
                    return Err(ExtractError::ClassifiedNonTransaction {
                        class: MessageClass::Unknown,
                        reason: "oracle judged the message non-transactional".to_string(),
                    });
                }

                let candidate =
                    self.synthesize(prediction, message, channel, now, fast_candidate.as_ref())?;

                if candidate.confidence < self.config.acceptance_floor {
                    self.stats.lock().rich_rejections += 1;
                    return Err(ExtractError::LowConfidence {
                        confidence: candidate.confidence,
                        floor: self.config.acceptance_floor,
                    });
                }

                self.stats.lock().rich_accepts += 1;
                Ok(EscalationResult {
                    fast_confidence: fast_candidate.map(|c| c.confidence),
                    candidate,
                    escalated: true,
                })
            }
            Ok(Err(err)) => self.fall_back(fast_candidate, map_oracle_error(err, started)),
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                self.fall_back(fast_candidate, ExtractError::OracleTimeout { elapsed_ms })
            }
        }
    }

    /// Oracle infrastructure failure: keep the fast result if allowed,
    /// otherwise surface the oracle error.
    fn fall_back(
        &self,
        fast_candidate: Option<CandidateTransaction>,
        err: ExtractError,
    ) -> Result<EscalationResult, ExtractError> {
        match fast_candidate {
            Some(candidate) if self.config.fallback_to_fast => {
                self.stats.lock().fast_fallbacks += 1;
                warn!(
                    error = %err,
                    confidence = candidate.confidence,
                    "oracle failed, keeping fast-tier result"
                );
                Ok(EscalationResult {
                    fast_confidence: Some(candidate.confidence),
                    candidate,
                    escalated: true,
                })
            }
            _ => {
                self.stats.lock().rich_rejections += 1;
                Err(err)
            }
        }
    }

    /// Build the rich candidate. Oracle fields win; anything the oracle left
    /// out is taken from the fast result or re-derived from the message text.
    fn synthesize(
        &self,
        prediction: OraclePrediction,
        message: &SmsMessage,
        routed: ChannelType,
        now: DateTime<Utc>,
        fast: Option<&CandidateTransaction>,
    ) -> Result<CandidateTransaction, ExtractError> {
        let vendor = prediction
            .vendor
            .or_else(|| fast.map(|f| f.vendor.clone()))
            .ok_or_else(|| ExtractError::EscalationFailed {
                reason: "neither tier produced a vendor".to_string(),
            })?;
        let amount = prediction
            .amount
            .or_else(|| fast.map(|f| f.amount))
            .ok_or_else(|| ExtractError::EscalationFailed {
                reason: "neither tier produced an amount".to_string(),
            })?;

        let direction = prediction
            .direction
            .unwrap_or_else(|| direction::infer_direction(&message.text));

        // Oracle dates obey the same rule as text dates: anything more than
        // a day in the future is distrusted.
        let date = prediction
            .date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .filter(|dt| *dt <= now + ChronoDuration::days(1))
            .unwrap_or_else(|| date::resolve(&message.text, message.received_at, now));

        let channel = prediction.channel.unwrap_or(routed);

        let mut meta = fast.map(|f| f.meta.clone()).unwrap_or_default();
        if let Some(reference) = prediction.reference {
            match channel {
                ChannelType::Upi => meta.upi_ref = Some(reference),
                _ => meta.bank_ref = Some(reference),
            }
        }

        Ok(CandidateTransaction::new(
            vendor,
            amount,
            direction,
            date,
            channel,
            message.text.as_str(),
        )
        .with_meta(meta)
        .with_confidence(prediction.confidence)
        .with_tier(ExtractionTier::Rich))
    }
}

fn map_oracle_error(err: OracleError, started: Instant) -> ExtractError {
    match err {
        OracleError::Timeout => ExtractError::OracleTimeout {
            elapsed_ms: started.elapsed().as_millis() as u64,
        },
        OracleError::Network(message) | OracleError::Api(message) => {
            ExtractError::OracleUnavailable { message }
        }
        OracleError::InvalidResponse(message) => ExtractError::EscalationFailed {
            reason: format!("malformed oracle response: {}", message),
        },
        OracleError::Disabled => ExtractError::EscalationFailed {
            reason: "oracle disabled".to_string(),
        },
        OracleError::Configuration(message) => ExtractError::EscalationFailed { reason: message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use sms_txn_core::Direction;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HIGH_CONF: &str =
        "Rs.499.00 debited from your A/c XX1234 via UPI to SWIGGY. UPI Ref no 423456789012.";
    const LOW_CONF: &str = "Rs.250.00 payment at DOMINOS on 12-08-2025.";
    const FIELD_MISS: &str = "Rs.120.00 processed successfully.";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 12, 18, 0, 0).unwrap()
    }

    fn rich_prediction(vendor: &str, amount: f64, confidence: f32) -> OraclePrediction {
        OraclePrediction {
            transactional: true,
            vendor: Some(vendor.to_string()),
            amount: Some(amount),
            direction: Some(Direction::Debit),
            date: None,
            channel: None,
            reference: None,
            confidence,
        }
    }

    struct ScriptedOracle {
        prediction: OraclePrediction,
        calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn new(prediction: OraclePrediction) -> Arc<Self> {
            Arc::new(Self {
                prediction,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TransactionOracle for ScriptedOracle {
        async fn predict(&self, _text: &str) -> Result<OraclePrediction, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.prediction.clone())
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl TransactionOracle for FailingOracle {
        async fn predict(&self, _text: &str) -> Result<OraclePrediction, OracleError> {
            Err(OracleError::Network("connection refused".to_string()))
        }

        async fn is_available(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct SlowOracle;

    #[async_trait]
    impl TransactionOracle for SlowOracle {
        async fn predict(&self, _text: &str) -> Result<OraclePrediction, OracleError> {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            Ok(rich_prediction("SWIGGY", 499.0, 0.9))
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn high_confidence_fast_result_skips_the_oracle() {
        let oracle = ScriptedOracle::new(rich_prediction("X", 1.0, 0.99));
        let controller = EscalationController::new(oracle.clone(), EscalationConfig::default());

        let message = SmsMessage::new(HIGH_CONF);
        let result = controller
            .extract(&message, ChannelType::Upi, now())
            .await
            .unwrap();

        assert!(!result.escalated);
        assert_eq!(result.candidate.tier, ExtractionTier::Fast);
        assert_eq!(result.candidate.vendor, "SWIGGY");
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.stats().fast_accepts, 1);
        assert_eq!(controller.stats().escalations, 0);
    }

    #[tokio::test]
    async fn low_confidence_fast_result_escalates() {
        let oracle = ScriptedOracle::new(rich_prediction("DOMINOS PIZZA", 250.0, 0.92));
        let controller = EscalationController::new(oracle.clone(), EscalationConfig::default());

        let message = SmsMessage::new(LOW_CONF);
        let result = controller
            .extract(&message, ChannelType::Other, now())
            .await
            .unwrap();

        assert!(result.escalated);
        assert_eq!(result.candidate.tier, ExtractionTier::Rich);
        assert_eq!(result.candidate.vendor, "DOMINOS PIZZA");
        assert!((result.candidate.confidence - 0.92).abs() < 1e-4);
        assert!(result.fast_confidence.is_some());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.stats().rich_accepts, 1);
        assert_eq!(controller.stats().oracle_responses, 1);
    }

    #[tokio::test]
    async fn field_miss_escalates_and_oracle_fills_fields() {
        let oracle = ScriptedOracle::new(rich_prediction("NETFLIX", 199.0, 0.88));
        let controller = EscalationController::new(oracle.clone(), EscalationConfig::default());

        let message = SmsMessage::new(FIELD_MISS);
        let result = controller
            .extract(&message, ChannelType::Other, now())
            .await
            .unwrap();

        assert!(result.escalated);
        assert_eq!(result.candidate.vendor, "NETFLIX");
        assert_eq!(result.candidate.amount, 199.0);
        assert_eq!(result.candidate.channel, ChannelType::Other);
        // No fast result existed for this message.
        assert!(result.fast_confidence.is_none());
    }

    #[tokio::test]
    async fn oracle_rejection_overrides_fast_result() {
        let oracle = ScriptedOracle::new(OraclePrediction::non_transactional(0.88));
        let controller = EscalationController::new(oracle, EscalationConfig::default());

        let message = SmsMessage::new(LOW_CONF);
        let err = controller
            .extract(&message, ChannelType::Other, now())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractError::ClassifiedNonTransaction { .. }));
        assert_eq!(controller.stats().rich_rejections, 1);
    }

    #[tokio::test]
    async fn oracle_timeout_falls_back_to_fast() {
        let config = EscalationConfig {
            oracle_timeout_ms: 5,
            ..EscalationConfig::default()
        };
        let controller = EscalationController::new(Arc::new(SlowOracle), config);

        let message = SmsMessage::new(LOW_CONF);
        let result = controller
            .extract(&message, ChannelType::Other, now())
            .await
            .unwrap();

        assert!(result.escalated);
        assert_eq!(result.candidate.tier, ExtractionTier::Fast);
        // The acceptance floor is not re-applied to a fallback result.
        assert!((result.candidate.confidence - 0.65).abs() < 1e-4);
        assert_eq!(controller.stats().fast_fallbacks, 1);
    }

    #[tokio::test]
    async fn oracle_failure_without_fallback_is_an_error() {
        let config = EscalationConfig {
            fallback_to_fast: false,
            ..EscalationConfig::default()
        };
        let controller = EscalationController::new(Arc::new(FailingOracle), config);

        let message = SmsMessage::new(LOW_CONF);
        let err = controller
            .extract(&message, ChannelType::Other, now())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractError::OracleUnavailable { .. }));
    }

    #[tokio::test]
    async fn oracle_failure_with_no_fast_result_is_an_error() {
        let controller =
            EscalationController::new(Arc::new(FailingOracle), EscalationConfig::default());

        let message = SmsMessage::new(FIELD_MISS);
        let err = controller
            .extract(&message, ChannelType::Other, now())
            .await
            .unwrap_err();

        // fallback_to_fast is set, but there is nothing to fall back to.
        assert!(matches!(err, ExtractError::OracleUnavailable { .. }));
    }

    #[tokio::test]
    async fn rich_result_below_floor_is_rejected() {
        let oracle = ScriptedOracle::new(rich_prediction("DOMINOS", 250.0, 0.5));
        let controller = EscalationController::new(oracle, EscalationConfig::default());

        let message = SmsMessage::new(LOW_CONF);
        let err = controller
            .extract(&message, ChannelType::Other, now())
            .await
            .unwrap_err();

        match err {
            ExtractError::LowConfidence { confidence, floor } => {
                assert!((confidence - 0.5).abs() < 1e-4);
                assert!((floor - 0.7).abs() < 1e-4);
            }
            other => panic!("expected LowConfidence, got {:?}", other),
        }
    }
}
