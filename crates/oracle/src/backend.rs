//! Oracle contract

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sms_txn_core::{ChannelType, Direction};

use crate::OracleError;

/// Fields predicted by the oracle for one message.
///
/// `transactional == false` means the oracle judged the message to be no
/// real money movement; the pipeline rejects such a message even when the
/// fast tier disagreed. Absent fields stay `None`, the caller supplies
/// fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OraclePrediction {
    pub transactional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub confidence: f32,
}

impl OraclePrediction {
    /// A non-transactional verdict with no field guesses.
    pub fn non_transactional(confidence: f32) -> Self {
        Self {
            transactional: false,
            vendor: None,
            amount: None,
            direction: None,
            date: None,
            channel: None,
            reference: None,
            confidence,
        }
    }
}

/// External prediction service consulted by the rich tier only.
#[async_trait]
pub trait TransactionOracle: Send + Sync {
    /// Predict transaction fields for one message text.
    async fn predict(&self, text: &str) -> Result<OraclePrediction, OracleError>;

    /// Cheap reachability probe, used by readiness checks.
    async fn is_available(&self) -> bool;

    /// Model or backend name, for logs and job output.
    fn name(&self) -> &str;
}

/// Stand-in wired when the oracle is disabled. Every call fails with
/// `Disabled`, which the escalation controller turns into a fast-tier
/// fallback.
pub struct NullOracle;

#[async_trait]
impl TransactionOracle for NullOracle {
    async fn predict(&self, _text: &str) -> Result<OraclePrediction, OracleError> {
        Err(OracleError::Disabled)
    }

    async fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_oracle_reports_disabled() {
        let oracle = NullOracle;
        assert!(!oracle.is_available().await);
        let err = oracle.predict("Rs.100 debited").await.unwrap_err();
        assert!(matches!(err, OracleError::Disabled));
    }

    #[test]
    fn absent_fields_are_skipped_in_json() {
        let prediction = OraclePrediction::non_transactional(0.9);
        let json = serde_json::to_string(&prediction).unwrap();
        assert!(!json.contains("vendor"));
        assert!(!json.contains("amount"));
        assert!(json.contains("\"transactional\":false"));
    }
}
