//! Fast-tier field extraction
//!
//! Turns a routed message into a [`sms_txn_core::CandidateTransaction`]
//! using regexes and lookup tables only, sub-millisecond and fully local:
//! - `amount` / `vendor` / `date` / `direction`: shared field parsers
//! - `channels`: one [`FieldExtractor`] per payment channel
//! - `fast`: dispatch by routed channel with a generic fallback
//!
//! Field-level misses surface as `AmountNotFound` / `VendorNotFound` so the
//! escalation controller can hand the message to the rich tier.

pub mod amount;
pub mod channels;
pub mod date;
pub mod direction;
pub mod fast;
pub mod vendor;

pub use channels::{
    CreditCardExtractor, DebitCardExtractor, FieldExtractor, GenericExtractor,
    NetBankingExtractor, SubscriptionExtractor, UpiExtractor,
};
pub use fast::FastTier;
