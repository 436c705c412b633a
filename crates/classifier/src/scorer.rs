//! Per-class weighted scoring
//!
//! One pure scoring function per message class. Each sums the weights of
//! matching markers and clamps to 1.0. No state, no errors.

use std::collections::HashSet;

use sms_txn_core::MessageClass;
use unicode_segmentation::UnicodeSegmentation;

use crate::keywords;

/// Scores for every class, computed over a single tokenization pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScores {
    pub transaction: f32,
    pub promotional: f32,
    pub notification: f32,
    pub spam: f32,
}

impl ClassScores {
    /// Highest-scoring class. Ties resolve in evaluation order:
    /// transaction, promotional, notification, spam.
    pub fn max_class(&self) -> (MessageClass, f32) {
        let ordered = [
            (MessageClass::RealTransaction, self.transaction),
            (MessageClass::Promotional, self.promotional),
            (MessageClass::Notification, self.notification),
            (MessageClass::Spam, self.spam),
        ];
        let mut best = ordered[0];
        for candidate in &ordered[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best
    }
}

pub(crate) fn token_set(text: &str) -> HashSet<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

fn weighted(
    tokens: &HashSet<String>,
    lowered: &str,
    token_table: &[(&str, f32)],
    phrase_table: &[(&str, f32)],
) -> f32 {
    let mut score = 0.0;
    for &(marker, weight) in token_table {
        if tokens.contains(marker) {
            score += weight;
        }
    }
    for &(marker, weight) in phrase_table {
        if lowered.contains(marker) {
            score += weight;
        }
    }
    score
}

fn transaction_inner(tokens: &HashSet<String>, lowered: &str) -> f32 {
    let mut score = weighted(
        tokens,
        lowered,
        keywords::TRANSACTION_TOKENS,
        keywords::TRANSACTION_PHRASES,
    );
    if keywords::CURRENCY_AMOUNT.is_match(lowered) {
        score += keywords::AMOUNT_SIGNAL;
    }
    score.min(1.0)
}

pub fn transaction_score(text: &str) -> f32 {
    transaction_inner(&token_set(text), &text.to_lowercase())
}

pub fn promotional_score(text: &str) -> f32 {
    weighted(
        &token_set(text),
        &text.to_lowercase(),
        keywords::PROMO_TOKENS,
        keywords::PROMO_PHRASES,
    )
    .min(1.0)
}

pub fn notification_score(text: &str) -> f32 {
    weighted(
        &token_set(text),
        &text.to_lowercase(),
        keywords::NOTIFICATION_TOKENS,
        keywords::NOTIFICATION_PHRASES,
    )
    .min(1.0)
}

pub fn spam_score(text: &str) -> f32 {
    weighted(
        &token_set(text),
        &text.to_lowercase(),
        keywords::SPAM_TOKENS,
        keywords::SPAM_PHRASES,
    )
    .min(1.0)
}

/// All four class scores in one tokenization pass.
pub fn score_all(text: &str) -> ClassScores {
    let tokens = token_set(text);
    let lowered = text.to_lowercase();
    ClassScores {
        transaction: transaction_inner(&tokens, &lowered),
        promotional: weighted(&tokens, &lowered, keywords::PROMO_TOKENS, keywords::PROMO_PHRASES)
            .min(1.0),
        notification: weighted(
            &tokens,
            &lowered,
            keywords::NOTIFICATION_TOKENS,
            keywords::NOTIFICATION_PHRASES,
        )
        .min(1.0),
        spam: weighted(&tokens, &lowered, keywords::SPAM_TOKENS, keywords::SPAM_PHRASES).min(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: f32, expected: f32) -> bool {
        (actual - expected).abs() < 1e-4
    }

    #[test]
    fn transaction_score_sums_verb_phrase_and_amount() {
        let score = transaction_score("paid electricity bill of INR 250 via netbanking ref no 884421");
        // paid 0.30 + "ref no" 0.10 + amount signal 0.25
        assert!(approx(score, 0.65), "got {score}");
    }

    #[test]
    fn token_matching_never_fires_on_substrings() {
        // "prepaid" must not hit "paid", "laptop" must not hit "otp".
        assert!(approx(transaction_score("recharge your prepaid plan today"), 0.0));
        assert!(approx(notification_score("your new laptop was delivered"), 0.0));
    }

    #[test]
    fn promotional_beats_transaction_on_cashback_bait() {
        let text = "Congrats! Rs.10,000 cashback credited to your SuperSaver card. Shop more & earn more!";
        let scores = score_all(text);
        // congrats 0.20 + cashback 0.30 + shop 0.15 + earn 0.15
        assert!(approx(scores.promotional, 0.80), "got {}", scores.promotional);
        // credited 0.35 + amount signal 0.25
        assert!(approx(scores.transaction, 0.60), "got {}", scores.transaction);
        assert_eq!(scores.max_class().0, MessageClass::Promotional);
    }

    #[test]
    fn spam_score_clamps_at_one() {
        let text = "Congratulations! You are the lucky winner of a lottery prize worth Rs.50,00,000. Claim now!";
        assert!(approx(spam_score(text), 1.0));
    }

    #[test]
    fn ties_resolve_in_evaluation_order() {
        let scores = ClassScores {
            transaction: 0.5,
            promotional: 0.5,
            notification: 0.5,
            spam: 0.5,
        };
        assert_eq!(scores.max_class(), (MessageClass::RealTransaction, 0.5));

        let scores = ClassScores {
            transaction: 0.1,
            promotional: 0.4,
            notification: 0.4,
            spam: 0.2,
        };
        assert_eq!(scores.max_class().0, MessageClass::Promotional);
    }

    #[test]
    fn empty_text_scores_zero_everywhere() {
        let scores = score_all("");
        assert!(approx(scores.transaction, 0.0));
        assert!(approx(scores.promotional, 0.0));
        assert!(approx(scores.notification, 0.0));
        assert!(approx(scores.spam, 0.0));
    }
}
