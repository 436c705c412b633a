//! Channel extractors
//!
//! One extractor per payment channel behind the [`FieldExtractor`] trait.
//! All share the same field skeleton (amount, vendor, date, direction) and
//! differ in the metadata they pull and in their vendor fallback. The
//! channel keyword counts toward confidence because an extractor only runs
//! for messages the router matched to its channel.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sms_txn_core::{
    CandidateTransaction, ChannelMeta, ChannelType, Direction, ExtractError, SmsMessage,
};

use crate::{amount, date, direction, vendor};

const AMOUNT_WEIGHT: f32 = 0.35;
const VENDOR_WEIGHT: f32 = 0.30;
const DIRECTION_WEIGHT: f32 = 0.20;
const CHANNEL_WEIGHT: f32 = 0.15;

static UPI_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)upi[:\s/-]*(?:ref(?:\s*no)?[.:\s]*)?(\d{9,14})\b").unwrap());

static CARD_LAST4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:card|crd)\s*(?:no\.?\s*)?(?:ending\s*(?:in\s*)?)?[x*]*(\d{4})\b").unwrap()
});

static BANK_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bref(?:erence)?\s*(?:no|num|number)?\s*[.:#]?\s*([a-z0-9]{6,18})\b").unwrap()
});

/// Known subscription services, matched case-insensitively on the raw text
/// so the original casing is preserved in the metadata.
static SERVICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        "netflix",
        "spotify",
        "hotstar",
        "audible",
        "prime video",
        "youtube premium",
        "disney\\+",
        "apple music",
        "google one",
    ]
    .iter()
    .map(|marker| Regex::new(&format!("(?i){marker}")).unwrap())
    .collect()
});

fn find_upi_ref(text: &str) -> Option<String> {
    UPI_REF
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

fn find_card_last4(text: &str) -> Option<String> {
    CARD_LAST4
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

fn find_bank_ref(text: &str) -> Option<String> {
    BANK_REF
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

fn find_service(text: &str) -> Option<String> {
    SERVICE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str().to_string())
}

/// A channel-specific field extractor. Implementations are stateless; the
/// default `extract` carries the shared skeleton.
pub trait FieldExtractor: Send + Sync {
    fn channel(&self) -> ChannelType;

    /// Channel metadata present in the text. Absent fields stay `None`.
    fn metadata(&self, text: &str) -> ChannelMeta;

    /// Vendor used when no anchor phrase matched. Default: none.
    fn fallback_vendor(&self, _text: &str) -> Option<String> {
        None
    }

    fn extract(
        &self,
        message: &SmsMessage,
        now: DateTime<Utc>,
    ) -> Result<CandidateTransaction, ExtractError> {
        let text = message.text.as_str();
        let amount = amount::parse_amount(text).ok_or(ExtractError::AmountNotFound)?;
        let vendor = vendor::parse_vendor(text)
            .or_else(|| self.fallback_vendor(text))
            .ok_or(ExtractError::VendorNotFound)?;
        let explicit = direction::explicit_direction(text);
        let resolved = date::resolve(text, message.received_at, now);

        let mut confidence = AMOUNT_WEIGHT + VENDOR_WEIGHT;
        if explicit.is_some() {
            confidence += DIRECTION_WEIGHT;
        }
        if self.channel() != ChannelType::Other {
            confidence += CHANNEL_WEIGHT;
        }

        Ok(CandidateTransaction::new(
            vendor,
            amount,
            explicit.unwrap_or(Direction::Debit),
            resolved,
            self.channel(),
            text,
        )
        .with_meta(self.metadata(text))
        .with_confidence(confidence))
    }
}

pub struct UpiExtractor;

impl FieldExtractor for UpiExtractor {
    fn channel(&self) -> ChannelType {
        ChannelType::Upi
    }

    fn metadata(&self, text: &str) -> ChannelMeta {
        ChannelMeta {
            upi_ref: find_upi_ref(text),
            ..Default::default()
        }
    }
}

pub struct CreditCardExtractor;

impl FieldExtractor for CreditCardExtractor {
    fn channel(&self) -> ChannelType {
        ChannelType::CreditCard
    }

    fn metadata(&self, text: &str) -> ChannelMeta {
        ChannelMeta {
            card_last4: find_card_last4(text),
            bank_ref: find_bank_ref(text),
            ..Default::default()
        }
    }
}

pub struct DebitCardExtractor;

impl FieldExtractor for DebitCardExtractor {
    fn channel(&self) -> ChannelType {
        ChannelType::DebitCard
    }

    fn metadata(&self, text: &str) -> ChannelMeta {
        ChannelMeta {
            card_last4: find_card_last4(text),
            bank_ref: find_bank_ref(text),
            ..Default::default()
        }
    }
}

pub struct SubscriptionExtractor;

impl FieldExtractor for SubscriptionExtractor {
    fn channel(&self) -> ChannelType {
        ChannelType::Subscription
    }

    fn metadata(&self, text: &str) -> ChannelMeta {
        ChannelMeta {
            service: find_service(text),
            card_last4: find_card_last4(text),
            upi_ref: find_upi_ref(text),
            ..Default::default()
        }
    }

    /// Subscription alerts often name only the service, never a payee.
    fn fallback_vendor(&self, text: &str) -> Option<String> {
        find_service(text)
    }
}

pub struct NetBankingExtractor;

impl FieldExtractor for NetBankingExtractor {
    fn channel(&self) -> ChannelType {
        ChannelType::NetBanking
    }

    fn metadata(&self, text: &str) -> ChannelMeta {
        ChannelMeta {
            bank_ref: find_bank_ref(text),
            ..Default::default()
        }
    }
}

pub struct GenericExtractor;

impl FieldExtractor for GenericExtractor {
    fn channel(&self) -> ChannelType {
        ChannelType::Other
    }

    fn metadata(&self, text: &str) -> ChannelMeta {
        ChannelMeta {
            bank_ref: find_bank_ref(text),
            ..Default::default()
        }
    }
}
