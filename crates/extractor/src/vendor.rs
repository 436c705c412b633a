//! Vendor extraction
//!
//! Anchor phrases locate the merchant ("Payee: X", "at X", "to X",
//! "from X"), then trailing boilerplate (dates, "via UPI", reference and
//! balance suffixes) is stripped. Captures that are masked numbers or
//! start with a pronoun are rejected so the next anchor gets a chance.

use once_cell::sync::Lazy;
use regex::Regex;

static ANCHORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bpayee\s*:?\s*([^.,;\n]+)").unwrap(),
        Regex::new(r"(?i)\bat\s+([^.,;\n]+)").unwrap(),
        Regex::new(r"(?i)\btowards\s+([^.,;\n]+)").unwrap(),
        Regex::new(r"(?i)\bto\s+([^.,;\n]+)").unwrap(),
        Regex::new(r"(?i)\bfrom\s+([^.,;\n]+)").unwrap(),
    ]
});

/// Everything from the first boilerplate word or date onward is trailer.
static TRAILER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s+(?:(?:on|at|from|to|for|via|using|dated|info|avl|was|is|has)\b|(?:ref|txn|bal|upi)\w*|\d{1,2}[-/]\d).*$",
    )
    .unwrap()
});

static MASKED_OR_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[\dx*\s-]+$").unwrap());

const STOPWORDS: &[&str] = &[
    "your", "you", "the", "my", "our", "this", "that", "a", "an", "it", "us", "me",
];

const MAX_VENDOR_LEN: usize = 60;

/// Merchant/counterparty name, if an anchor phrase matches.
pub fn parse_vendor(text: &str) -> Option<String> {
    for anchor in ANCHORS.iter() {
        for captures in anchor.captures_iter(text) {
            let Some(raw) = captures.get(1) else { continue };
            if let Some(vendor) = clean(raw.as_str()) {
                return Some(vendor);
            }
        }
    }
    None
}

fn clean(raw: &str) -> Option<String> {
    let cut = TRAILER.replace(raw.trim(), "");
    let vendor = cut
        .trim()
        .trim_matches(|c: char| "-:/#'\"".contains(c))
        .trim();
    if vendor.is_empty() || vendor.len() > MAX_VENDOR_LEN {
        return None;
    }
    if MASKED_OR_NUMERIC.is_match(vendor) {
        return None;
    }
    let first_word = vendor.split_whitespace().next()?.to_lowercase();
    if STOPWORDS.contains(&first_word.as_str()) || first_word == "a/c" || first_word == "account" {
        return None;
    }
    // A leading bare number is a time or reference, not a merchant.
    if first_word.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(vendor.to_string())
}
