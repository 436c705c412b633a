//! Pre-filter classification types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message class assigned by the pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageClass {
    /// A genuine money-movement notification
    RealTransaction,
    /// Marketing / offers / cashback bait
    Promotional,
    /// OTPs, balance updates, reminders, statements
    Notification,
    /// Lottery/prize scams and similar junk
    Spam,
    /// No class scored high enough to decide
    Unknown,
}

impl MessageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageClass::RealTransaction => "real_transaction",
            MessageClass::Promotional => "promotional",
            MessageClass::Notification => "notification",
            MessageClass::Spam => "spam",
            MessageClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the pre-filter for one message.
///
/// Ephemeral: consumed by the pipeline gate and surfaced in audit output,
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub class: MessageClass,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Human-readable audit trail for why this class won
    pub reason: String,
}

impl Classification {
    pub fn new(class: MessageClass, confidence: f32, reason: impl Into<String>) -> Self {
        Self {
            class,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }

    /// Downstream gate: extraction proceeds only for a real transaction whose
    /// confidence clears the accept threshold.
    pub fn should_extract(&self, accept_threshold: f32) -> bool {
        self.class == MessageClass::RealTransaction && self.confidence > accept_threshold
    }
}
