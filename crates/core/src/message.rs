//! Raw SMS message envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw inbound SMS as handed to the pipeline.
///
/// Immutable input: the pipeline borrows it for the duration of one
/// extraction pass and never persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsMessage {
    /// Full message body as received
    pub text: String,
    /// Sender id / DLT header (e.g. "VM-HDFCBK") when the gateway provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Time the device or gateway received the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
}

impl SmsMessage {
    /// Create a message from body text alone.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: None,
            received_at: None,
        }
    }

    /// Attach the sender id.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Attach the receipt timestamp.
    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = Some(received_at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builder_sets_optional_fields() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let msg = SmsMessage::new("Rs.100 debited")
            .with_sender("VM-HDFCBK")
            .with_received_at(ts);

        assert_eq!(msg.text, "Rs.100 debited");
        assert_eq!(msg.sender.as_deref(), Some("VM-HDFCBK"));
        assert_eq!(msg.received_at, Some(ts));
    }

    #[test]
    fn serde_skips_absent_fields() {
        let json = serde_json::to_string(&SmsMessage::new("hi")).unwrap();
        assert!(!json.contains("sender"));
        assert!(!json.contains("received_at"));

        let parsed: SmsMessage = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(parsed, SmsMessage::new("hi"));
    }
}
