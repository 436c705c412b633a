//! Pre-filter
//!
//! Front gate of the pipeline. Combines the class scorers with strong
//! transaction patterns, a sender-reputation boost, and a sanity rule that
//! keeps money-adjacent marketing out of the extraction path:
//! - strong pattern + amount present short-circuits to real_transaction
//! - known financial sender boosts the transaction score
//! - best score below the floor resolves to unknown
//! - a real_transaction winner without both an amount and a movement verb
//!   is reclassified to promotional or notification

use sms_txn_config::{PrefilterConfig, SenderRegistry};
use sms_txn_core::{Classification, MessageClass, SmsMessage};
use tracing::debug;

use crate::keywords;
use crate::scorer::score_all;

pub struct PreFilter {
    config: PrefilterConfig,
    senders: SenderRegistry,
}

impl PreFilter {
    pub fn new(config: PrefilterConfig, senders: SenderRegistry) -> Self {
        Self { config, senders }
    }

    /// Classify one raw message. Total function, never errors.
    pub fn classify(&self, message: &SmsMessage) -> Classification {
        let text = message.text.as_str();
        let has_amount = keywords::has_currency_amount(text);
        let has_verb = keywords::has_action_verb(text);

        if has_amount {
            if let Some(description) = keywords::strong_transaction_pattern(text) {
                return Classification::new(
                    MessageClass::RealTransaction,
                    self.config.strong_pattern_confidence,
                    format!("strong pattern: {description}"),
                );
            }
        }

        let mut scores = score_all(text);

        let financial_sender = message
            .sender
            .as_deref()
            .map(|sender| self.senders.is_financial_sender(sender))
            .unwrap_or(false);
        if financial_sender {
            scores.transaction = (scores.transaction + self.config.sender_boost).min(1.0);
        }

        let (class, confidence) = scores.max_class();

        if confidence < self.config.unknown_floor {
            return Classification::new(
                MessageClass::Unknown,
                confidence,
                format!(
                    "best score {:.2} below floor {:.2}",
                    confidence, self.config.unknown_floor
                ),
            );
        }

        // Real money movement always carries an amount and a verb. A winner
        // missing either is marketing or a notification that mentions money.
        if class == MessageClass::RealTransaction && !(has_amount && has_verb) {
            let missing = match (has_amount, has_verb) {
                (false, false) => "currency amount and movement verb",
                (false, true) => "currency amount",
                _ => "movement verb",
            };
            let (demoted, demoted_confidence) = if scores.promotional >= scores.notification {
                (MessageClass::Promotional, scores.promotional)
            } else {
                (MessageClass::Notification, scores.notification)
            };
            debug!(class = demoted.as_str(), missing, "reclassified transaction-shaped message");
            return Classification::new(
                demoted,
                demoted_confidence,
                format!("reclassified from real_transaction: missing {missing}"),
            );
        }

        let reason = if financial_sender && class == MessageClass::RealTransaction {
            format!("{} scored {:.2} with financial sender", class.as_str(), confidence)
        } else {
            format!("{} scored {:.2}", class.as_str(), confidence)
        };
        Classification::new(class, confidence, reason)
    }

    /// True when the message should proceed to extraction.
    pub fn should_extract(&self, classification: &Classification) -> bool {
        classification.should_extract(self.config.accept_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> PreFilter {
        PreFilter::new(PrefilterConfig::default(), SenderRegistry::builtin())
    }

    fn classify_text(text: &str) -> Classification {
        filter().classify(&SmsMessage::new(text))
    }

    const SWIGGY: &str = "Rs.499.00 debited from A/c XX4321 on 12-08-25 via UPI:423456789012. \
        Payee: SWIGGY. Avl bal: Rs.15,432.50. Not you? Call 18002586161 - Kotak Bank";

    #[test]
    fn strong_pattern_short_circuits_at_high_confidence() {
        let classification = classify_text(SWIGGY);
        assert_eq!(classification.class, MessageClass::RealTransaction);
        assert!((classification.confidence - 0.95).abs() < 1e-4);
        assert!(classification.reason.contains("strong pattern"));
        assert!(filter().should_extract(&classification));
    }

    #[test]
    fn cashback_bait_is_rejected_before_extraction() {
        let classification = classify_text(
            "Congrats! Rs.10,000 cashback credited to your SuperSaver card. Shop more & earn more!",
        );
        assert_eq!(classification.class, MessageClass::Promotional);
        assert!(!filter().should_extract(&classification));
    }

    #[test]
    fn otp_is_a_notification() {
        let classification = classify_text("Your OTP for login is 482913. Do not share it with anyone.");
        assert_eq!(classification.class, MessageClass::Notification);
        assert!((classification.confidence - 0.70).abs() < 1e-4);
    }

    #[test]
    fn lottery_bait_is_spam() {
        let classification = classify_text(
            "Congratulations! You are the lucky winner of a lottery prize worth Rs.50,00,000. Claim now!",
        );
        assert_eq!(classification.class, MessageClass::Spam);
        assert!((classification.confidence - 1.0).abs() < 1e-4);
    }

    #[test]
    fn unmarked_text_is_unknown() {
        let classification = classify_text("see you at the station around five");
        assert_eq!(classification.class, MessageClass::Unknown);
        assert!(classification.confidence < 0.3);
    }

    #[test]
    fn financial_sender_boosts_a_borderline_message() {
        let text = "paid electricity bill of INR 250 via netbanking ref no 884421";
        let anonymous = classify_text(text);
        assert_eq!(anonymous.class, MessageClass::RealTransaction);
        assert!((anonymous.confidence - 0.65).abs() < 1e-4);

        let from_bank = filter().classify(&SmsMessage::new(text).with_sender("VM-KOTAKB"));
        assert_eq!(from_bank.class, MessageClass::RealTransaction);
        assert!((from_bank.confidence - 0.85).abs() < 1e-4);
        assert!(from_bank.reason.contains("financial sender"));
    }

    #[test]
    fn verb_without_amount_is_reclassified() {
        let classification =
            classify_text("your account was debited successfully thank you for shopping");
        assert_eq!(classification.class, MessageClass::Promotional);
        assert!(classification.reason.contains("reclassified"));
        assert!(classification.reason.contains("currency amount"));
    }

    #[test]
    fn no_amount_never_clears_the_extraction_gate() {
        let texts = [
            "debited credited withdrawn transferred paid",
            "amount debited and credited to your a/c ref no 1234",
            "you paid and received and sent and spent today",
        ];
        for text in texts {
            let classification = classify_text(text);
            let gated = classification.class == MessageClass::RealTransaction
                && classification.confidence > 0.6;
            assert!(!gated, "{text:?} cleared the gate as {classification:?}");
        }
    }
}
