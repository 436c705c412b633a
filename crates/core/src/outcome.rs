//! Per-item outcome vocabulary for job logs and audit output

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which dedup check identified a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMethod {
    /// External reference id (UPI ref, bank ref) already seen
    Reference,
    /// Content hash of (vendor, amount, date) already seen
    Hash,
    /// Same vendor and amount within the similarity time window
    Similarity,
}

impl DedupMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupMethod::Reference => "reference",
            DedupMethod::Hash => "hash",
            DedupMethod::Similarity => "similarity",
        }
    }
}

impl fmt::Display for DedupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One processed item in a batch job's trailing log.
///
/// `code` is a stable machine-readable label; `detail` is the human-readable
/// reason an auditor reads to distinguish "this was spam" from "this looked
/// real but timed out".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Position of the message in the submitted batch
    pub index: usize,
    pub accepted: bool,
    pub code: String,
    pub detail: String,
}

impl ItemOutcome {
    pub fn accepted(index: usize, detail: impl Into<String>) -> Self {
        Self {
            index,
            accepted: true,
            code: "accepted".to_string(),
            detail: detail.into(),
        }
    }

    pub fn rejected(index: usize, code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            index,
            accepted: false,
            code: code.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_accepted_flag() {
        let ok = ItemOutcome::accepted(3, "SWIGGY 499.00");
        assert!(ok.accepted);
        assert_eq!(ok.code, "accepted");

        let bad = ItemOutcome::rejected(4, "duplicate", "same reference");
        assert!(!bad.accepted);
        assert_eq!(bad.code, "duplicate");
    }

    #[test]
    fn method_labels_are_stable() {
        assert_eq!(DedupMethod::Reference.as_str(), "reference");
        assert_eq!(DedupMethod::Hash.as_str(), "hash");
        assert_eq!(DedupMethod::Similarity.as_str(), "similarity");
    }
}
