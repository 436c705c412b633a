//! Core types and traits for the SMS transaction pipeline
//!
//! This crate provides the foundational vocabulary used across all other crates:
//! - Raw message envelope ([`SmsMessage`])
//! - Pre-filter classification types ([`Classification`], [`MessageClass`])
//! - The structured transaction record ([`CandidateTransaction`]) and channel vocabulary
//! - The per-item error taxonomy ([`ExtractError`])
//! - Storage collaborator boundary ([`TransactionSink`])

pub mod classification;
pub mod error;
pub mod message;
pub mod outcome;
pub mod traits;
pub mod transaction;

pub use classification::{Classification, MessageClass};
pub use error::ExtractError;
pub use message::SmsMessage;
pub use outcome::{DedupMethod, ItemOutcome};
pub use traits::{SinkError, TransactionSink};
pub use transaction::{CandidateTransaction, ChannelMeta, ChannelType, Direction, ExtractionTier};
