//! Amount parsing
//!
//! Currency-prefixed numeric patterns with Indian comma grouping and
//! lakh/crore multipliers. A balance marker ("Avl bal:", "credit limit")
//! taints the next amount after it, so the moved amount wins over the
//! quoted balance wherever the two appear in the message.

use once_cell::sync::Lazy;
use regex::Regex;

static AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:rs\.?|inr|₹)\s*([\d,]+(?:\.\d{1,2})?)(?:\s*(lakh|lac|crore)s?\b)?")
        .unwrap()
});

const BALANCE_MARKERS: &[&str] = &["bal", "limit"];

/// First transaction amount in the text, skipping balance mentions.
pub fn parse_amount(text: &str) -> Option<f64> {
    let lowered = text.to_lowercase();
    let mut previous_end = 0;
    for captures in AMOUNT.captures_iter(&lowered) {
        let Some(whole) = captures.get(0) else { continue };
        let gap = &lowered[previous_end..whole.start()];
        previous_end = whole.end();
        if BALANCE_MARKERS.iter().any(|marker| gap.contains(marker)) {
            continue;
        }
        let Some(digits) = captures.get(1) else { continue };
        let value: f64 = match digits.as_str().replace(',', "").parse() {
            Ok(value) => value,
            Err(_) => continue,
        };
        let multiplier = match captures.get(2).map(|m| m.as_str()) {
            Some("lakh") | Some("lac") => 100_000.0,
            Some("crore") => 10_000_000.0,
            _ => 1.0,
        };
        let value = value * multiplier;
        if value > 0.0 {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_currency_prefixes() {
        assert_eq!(parse_amount("Rs.499.00 debited"), Some(499.0));
        assert_eq!(parse_amount("INR 2,500 credited"), Some(2500.0));
        assert_eq!(parse_amount("₹599 paid to vendor"), Some(599.0));
        assert_eq!(parse_amount("rs 1,23,456.78 transferred"), Some(123456.78));
    }

    #[test]
    fn applies_lakh_and_crore_multipliers() {
        assert_eq!(parse_amount("loan of Rs.2 lakh disbursed"), Some(200_000.0));
        assert_eq!(parse_amount("Rs. 1.5 crore credited"), Some(15_000_000.0));
        assert_eq!(parse_amount("INR 3 lacs transferred"), Some(300_000.0));
    }

    #[test]
    fn skips_balance_context() {
        let text = "Rs.499.00 debited from A/c XX4321. Avl bal: Rs.15,432.50";
        assert_eq!(parse_amount(text), Some(499.0));

        // Balance quoted first, then the moved amount.
        let text = "Avl bal: Rs.15,432.50 after Rs.499.00 was debited";
        assert_eq!(parse_amount(text), Some(499.0));

        // Only a balance present, nothing to extract.
        assert_eq!(parse_amount("Your available balance is Rs.5,000.00"), None);
        assert_eq!(parse_amount("Credit limit increased to Rs.1,00,000"), None);
    }

    #[test]
    fn rejects_unprefixed_or_missing_numbers() {
        assert_eq!(parse_amount("499.00 debited"), None);
        assert_eq!(parse_amount("no amounts here"), None);
        assert_eq!(parse_amount("Rs.0 debited"), None);
    }
}
