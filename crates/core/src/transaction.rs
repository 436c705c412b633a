//! Structured transaction record and channel vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment rail a transaction used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Upi,
    CreditCard,
    DebitCard,
    Subscription,
    NetBanking,
    Other,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Upi => "upi",
            ChannelType::CreditCard => "credit_card",
            ChannelType::DebitCard => "debit_card",
            ChannelType::Subscription => "subscription",
            ChannelType::NetBanking => "net_banking",
            ChannelType::Other => "other",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the money movement, from the account holder's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "debit",
            Direction::Credit => "credit",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which extraction tier produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    /// Local regex + lookup tables, sub-millisecond
    Fast,
    /// Oracle-backed extraction, hundreds of ms to seconds
    Rich,
}

impl ExtractionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionTier::Fast => "fast",
            ExtractionTier::Rich => "rich",
        }
    }
}

/// Channel-specific metadata captured during extraction.
///
/// Absent fields stay `None`; extractors populate only what the message
/// actually contains, never guesses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMeta {
    /// Last four digits of the card, for card channels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
    /// UPI transaction reference id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_ref: Option<String>,
    /// Subscription service name (Netflix, Spotify, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Bank-side reference (NEFT/IMPS/RTGS reference number)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_ref: Option<String>,
}

impl ChannelMeta {
    pub fn is_empty(&self) -> bool {
        self.card_last4.is_none()
            && self.upi_ref.is_none()
            && self.service.is_none()
            && self.bank_ref.is_none()
    }

    /// Reference usable for exact duplicate matching. Channel-level refs
    /// (UPI) take precedence over bank-side ones.
    pub fn external_ref(&self) -> Option<&str> {
        self.upi_ref.as_deref().or(self.bank_ref.as_deref())
    }
}

/// A structured transaction produced by one of the extraction tiers.
///
/// Invariants: `amount > 0`; `confidence` in [0, 1]. The date is always
/// resolved (explicit date in the message, else receipt time, else processing
/// time) before a candidate is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTransaction {
    pub vendor: String,
    pub amount: f64,
    pub direction: Direction,
    pub date: DateTime<Utc>,
    pub channel: ChannelType,
    #[serde(default, skip_serializing_if = "ChannelMeta::is_empty")]
    pub meta: ChannelMeta,
    /// How many fields were positively matched vs. defaulted, in [0, 1]
    pub confidence: f32,
    pub tier: ExtractionTier,
    /// Original message body the record was extracted from
    pub source_text: String,
}

impl CandidateTransaction {
    pub fn new(
        vendor: impl Into<String>,
        amount: f64,
        direction: Direction,
        date: DateTime<Utc>,
        channel: ChannelType,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            amount,
            direction,
            date,
            channel,
            meta: ChannelMeta::default(),
            confidence: 0.0,
            tier: ExtractionTier::Fast,
            source_text: source_text.into(),
        }
    }

    pub fn with_meta(mut self, meta: ChannelMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_tier(mut self, tier: ExtractionTier) -> Self {
        self.tier = tier;
        self
    }

    /// External reference carried by this candidate, if any.
    pub fn external_ref(&self) -> Option<&str> {
        self.meta.external_ref()
    }
}
