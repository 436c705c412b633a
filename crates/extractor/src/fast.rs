//! Fast-tier dispatch

use chrono::{DateTime, Utc};
use sms_txn_core::{CandidateTransaction, ChannelType, ExtractError, SmsMessage};
use tracing::debug;

use crate::channels::{
    CreditCardExtractor, DebitCardExtractor, FieldExtractor, GenericExtractor,
    NetBankingExtractor, SubscriptionExtractor, UpiExtractor,
};

/// Local extraction tier. Picks the routed channel's extractor and falls
/// back to the generic one for unmatched channels.
pub struct FastTier {
    extractors: Vec<Box<dyn FieldExtractor>>,
    generic: GenericExtractor,
}

impl FastTier {
    pub fn new() -> Self {
        Self {
            extractors: vec![
                Box::new(SubscriptionExtractor),
                Box::new(UpiExtractor),
                Box::new(CreditCardExtractor),
                Box::new(DebitCardExtractor),
                Box::new(NetBankingExtractor),
            ],
            generic: GenericExtractor,
        }
    }

    pub fn extract(
        &self,
        message: &SmsMessage,
        channel: ChannelType,
        now: DateTime<Utc>,
    ) -> Result<CandidateTransaction, ExtractError> {
        let result = match self.extractors.iter().find(|e| e.channel() == channel) {
            Some(extractor) => extractor.extract(message, now),
            None => self.generic.extract(message, now),
        };
        match &result {
            Ok(candidate) => debug!(
                channel = channel.as_str(),
                vendor = %candidate.vendor,
                amount = candidate.amount,
                confidence = candidate.confidence,
                "fast tier extracted"
            ),
            Err(error) => debug!(channel = channel.as_str(), code = error.code(), "fast tier miss"),
        }
        result
    }
}

impl Default for FastTier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sms_txn_core::Direction;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 12, 18, 0, 0).unwrap()
    }

    #[test]
    fn dispatches_by_channel() {
        let tier = FastTier::new();
        let message = SmsMessage::new(
            "Rs.499.00 debited from A/c XX4321 via UPI:423456789012. Payee: SWIGGY",
        );
        let txn = tier.extract(&message, ChannelType::Upi, now()).unwrap();
        assert_eq!(txn.channel, ChannelType::Upi);
        assert_eq!(txn.vendor, "SWIGGY");
        assert_eq!(txn.direction, Direction::Debit);
    }

    #[test]
    fn unmatched_channel_uses_generic() {
        let tier = FastTier::new();
        let message = SmsMessage::new("Rs.300 debited, sent to WALLETCO");
        let txn = tier.extract(&message, ChannelType::Other, now()).unwrap();
        assert_eq!(txn.channel, ChannelType::Other);
        assert_eq!(txn.vendor, "WALLETCO");
    }
}
