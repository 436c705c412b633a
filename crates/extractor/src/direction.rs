//! Direction inference
//!
//! Marker verbs decide debit vs credit; the earliest marker in the text
//! wins, and messages with no marker default to debit.

use once_cell::sync::Lazy;
use regex::Regex;
use sms_txn_core::Direction;

static DEBIT_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:debited|paid|spent|withdrawn|deducted|sent|transferred|purchased|charged|dr)\b")
        .unwrap()
});

static CREDIT_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:credited|received|deposited|refund(?:ed)?|revers(?:ed|al)|cr)\b").unwrap()
});

/// Direction stated by the message, if any.
pub fn explicit_direction(text: &str) -> Option<Direction> {
    let debit = DEBIT_MARKERS.find(text).map(|m| m.start());
    let credit = CREDIT_MARKERS.find(text).map(|m| m.start());
    match (debit, credit) {
        (Some(debit), Some(credit)) if credit < debit => Some(Direction::Credit),
        (Some(_), _) => Some(Direction::Debit),
        (None, Some(_)) => Some(Direction::Credit),
        (None, None) => None,
    }
}

/// Direction with the debit default applied.
pub fn infer_direction(text: &str) -> Direction {
    explicit_direction(text).unwrap_or(Direction::Debit)
}
