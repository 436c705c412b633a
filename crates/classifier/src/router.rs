//! Channel router
//!
//! Maps message text to a payment channel with ordered first-match
//! precedence, most specific first: subscription services, then UPI, then
//! credit card, debit card, net banking. No scoring, always returns a type.

use sms_txn_core::ChannelType;

use crate::scorer::token_set;

const SUBSCRIPTION_TOKENS: &[&str] = &[
    "subscription",
    "renewal",
    "renewed",
    "autopay",
    "membership",
    "netflix",
    "spotify",
    "hotstar",
    "audible",
];

const SUBSCRIPTION_PHRASES: &[&str] = &[
    "prime video",
    "youtube premium",
    "disney+",
    "apple music",
    "google one",
    "e-mandate",
];

const UPI_TOKENS: &[&str] = &["upi", "vpa", "bhim", "gpay", "phonepe"];

const UPI_PHRASES: &[&str] = &["@ok", "@ybl", "@axl", "@ibl", "@paytm"];

const CREDIT_CARD_TOKENS: &[&str] = &["creditcard"];

const CREDIT_CARD_PHRASES: &[&str] = &["credit card", "credit crd", "cr card"];

const DEBIT_CARD_TOKENS: &[&str] = &["atm", "pos", "debitcard"];

const DEBIT_CARD_PHRASES: &[&str] = &["debit card", "debit crd", "dr card"];

const NET_BANKING_TOKENS: &[&str] = &["netbanking", "neft", "imps", "rtgs"];

const NET_BANKING_PHRASES: &[&str] = &["net banking", "internet banking"];

const CHANNEL_RULES: &[(ChannelType, &[&str], &[&str])] = &[
    (ChannelType::Subscription, SUBSCRIPTION_TOKENS, SUBSCRIPTION_PHRASES),
    (ChannelType::Upi, UPI_TOKENS, UPI_PHRASES),
    (ChannelType::CreditCard, CREDIT_CARD_TOKENS, CREDIT_CARD_PHRASES),
    (ChannelType::DebitCard, DEBIT_CARD_TOKENS, DEBIT_CARD_PHRASES),
    (ChannelType::NetBanking, NET_BANKING_TOKENS, NET_BANKING_PHRASES),
];

/// Route message text to its payment channel. First matching rule wins.
pub fn route(text: &str) -> ChannelType {
    let tokens = token_set(text);
    let lowered = text.to_lowercase();
    for &(channel, channel_tokens, channel_phrases) in CHANNEL_RULES {
        let hit = channel_tokens.iter().any(|token| tokens.contains(*token))
            || channel_phrases.iter().any(|phrase| lowered.contains(phrase));
        if hit {
            return channel;
        }
    }
    ChannelType::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upi_marker_routes_to_upi() {
        let text = "Rs.499.00 debited from A/c XX4321 via UPI:423456789012. Payee: SWIGGY";
        assert_eq!(route(text), ChannelType::Upi);
    }

    #[test]
    fn subscription_outranks_upi() {
        let text = "Rs.199 debited for Netflix subscription via UPI autopay";
        assert_eq!(route(text), ChannelType::Subscription);
    }

    #[test]
    fn credit_outranks_debit() {
        let text = "EMI of Rs.1,200 charged on your Credit Card XX9911; do not use your debit card";
        assert_eq!(route(text), ChannelType::CreditCard);
    }

    #[test]
    fn card_and_banking_markers() {
        assert_eq!(route("Rs.800 spent on HDFC Bank Credit Card xx0088"), ChannelType::CreditCard);
        assert_eq!(route("Rs.2,000 withdrawn at ATM from A/c XX1234"), ChannelType::DebitCard);
        assert_eq!(
            route("paid electricity bill of INR 250 via netbanking ref no 884421"),
            ChannelType::NetBanking
        );
        assert_eq!(route("NEFT of Rs.5,000 credited to your a/c"), ChannelType::NetBanking);
    }

    #[test]
    fn vpa_handle_routes_to_upi() {
        assert_eq!(route("Rs.150 sent to ramesh@okhdfcbank"), ChannelType::Upi);
    }

    #[test]
    fn unmatched_text_routes_to_other() {
        assert_eq!(route("Rs.300 debited from your wallet"), ChannelType::Other);
    }
}
