//! Weighted marker tables and shared pattern set
//!
//! Single-word markers are matched as whole tokens (so "atm" never hits
//! "treatment"); multi-word or symbol markers as substrings. Weights are
//! hand-tuned against Indian bank, PSP, and merchant SMS.

use once_cell::sync::Lazy;
use regex::Regex;

/// Added to the transaction score when a currency amount is present.
pub(crate) const AMOUNT_SIGNAL: f32 = 0.25;

pub(crate) const TRANSACTION_TOKENS: &[(&str, f32)] = &[
    ("debited", 0.40),
    ("credited", 0.35),
    ("withdrawn", 0.35),
    ("deducted", 0.30),
    ("paid", 0.30),
    ("spent", 0.30),
    ("transferred", 0.30),
    ("received", 0.25),
    ("sent", 0.20),
    ("purchase", 0.20),
    ("purchased", 0.20),
    ("txn", 0.15),
    ("transaction", 0.15),
];

pub(crate) const TRANSACTION_PHRASES: &[(&str, f32)] = &[
    ("a/c", 0.10),
    ("avl bal", 0.15),
    ("available balance", 0.10),
    ("ref no", 0.10),
];

pub(crate) const PROMO_TOKENS: &[(&str, f32)] = &[
    ("cashback", 0.30),
    ("offer", 0.30),
    ("offers", 0.30),
    ("discount", 0.25),
    ("coupon", 0.25),
    ("voucher", 0.25),
    ("promo", 0.25),
    ("hurry", 0.25),
    ("sale", 0.20),
    ("congrats", 0.20),
    ("congratulations", 0.20),
    ("free", 0.20),
    ("exclusive", 0.20),
    ("deal", 0.20),
    ("deals", 0.20),
    ("win", 0.15),
    ("shop", 0.15),
    ("shopping", 0.15),
    ("earn", 0.15),
    ("reward", 0.15),
    ("rewards", 0.15),
    ("avail", 0.15),
    ("upgrade", 0.15),
];

pub(crate) const PROMO_PHRASES: &[(&str, f32)] = &[
    ("% off", 0.30),
    ("apply now", 0.25),
    ("limited time", 0.25),
    ("limited period", 0.25),
    ("t&c", 0.15),
];

pub(crate) const NOTIFICATION_TOKENS: &[(&str, f32)] = &[
    ("otp", 0.40),
    ("verification", 0.30),
    ("kyc", 0.30),
    ("reminder", 0.25),
    ("statement", 0.25),
    ("password", 0.20),
    ("verify", 0.20),
    ("balance", 0.20),
    ("due", 0.20),
    ("expires", 0.20),
    ("expiry", 0.20),
    ("updated", 0.15),
    ("mandate", 0.15),
    ("registered", 0.15),
    ("alert", 0.10),
    ("generated", 0.10),
];

pub(crate) const NOTIFICATION_PHRASES: &[(&str, f32)] = &[
    ("one time password", 0.40),
    ("verification code", 0.35),
    ("do not share", 0.30),
    ("due date", 0.20),
];

pub(crate) const SPAM_TOKENS: &[(&str, f32)] = &[
    ("lottery", 0.40),
    ("jackpot", 0.40),
    ("winner", 0.35),
    ("prize", 0.30),
    ("won", 0.25),
    ("lucky", 0.25),
    ("urgent", 0.25),
    ("claim", 0.20),
    ("guaranteed", 0.20),
];

pub(crate) const SPAM_PHRASES: &[(&str, f32)] = &[
    ("click here", 0.30),
    ("act now", 0.30),
    ("claim now", 0.30),
    ("call now", 0.25),
    ("pre-approved", 0.25),
];

/// Currency amount with an Rs./INR/₹ prefix, comma grouping allowed.
pub static CURRENCY_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:rs\.?|inr|₹)\s*[\d,]+(?:\.\d{1,2})?").unwrap());

/// Money-movement verbs, whole-word.
pub static ACTION_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:debited|credited|paid|received|withdrawn|transferred|sent|spent|deducted|purchased?)\b")
        .unwrap()
});

/// Patterns strong enough to classify a message as a real transaction on
/// their own, with the description surfaced in the reason string.
pub(crate) static STRONG_TRANSACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)(?:rs\.?|inr|₹)\s*[\d,]+(?:\.\d{1,2})?\s+(?:(?:has|have)\s+been\s+|was\s+|is\s+)?(?:debited|credited|withdrawn|deducted|paid|sent|received|transferred)").unwrap(),
            "amount adjacent to movement verb",
        ),
        (
            Regex::new(r"(?i)(?:debited|credited|withdrawn|deducted|paid)\s+(?:(?:by|with|for|of)\s+)?(?:rs\.?|inr|₹)\s*[\d,]+").unwrap(),
            "movement verb adjacent to amount",
        ),
        (
            Regex::new(r"(?i)a/c\s*(?:no\.?\s*)?[x*]*\d+\s+(?:is\s+|has\s+been\s+)?(?:debited|credited)").unwrap(),
            "explicit account movement phrase",
        ),
        (
            Regex::new(r"(?i)(?:debited|credited|paid|sent|received)\s+(?:from|to|via|using)\s+(?:your\s+)?(?:upi|vpa)").unwrap(),
            "UPI movement phrase",
        ),
    ]
});

/// First strong pattern matching the text, if any.
pub fn strong_transaction_pattern(text: &str) -> Option<&'static str> {
    STRONG_TRANSACTION_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, desc)| *desc)
}

pub fn has_currency_amount(text: &str) -> bool {
    CURRENCY_AMOUNT.is_match(text)
}

pub fn has_action_verb(text: &str) -> bool {
    ACTION_VERB.is_match(text)
}
