//! Financial-institution sender registry
//!
//! Indian bank and PSP SMS arrive under DLT headers like `VM-HDFCBK` or
//! `AD-SBIINB`: a two-letter route prefix, a dash, and a short entity code.
//! The registry holds known entity codes plus a generic banking-header
//! heuristic, and answers "does this sender look like a financial
//! institution" for the pre-filter's confidence boost.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// DLT header shape: route prefix, optional dash, entity code.
static HEADER_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}-?[A-Z0-9]{5,9}$").unwrap());

/// Generic banking fragments for headers not in the code list.
static BANK_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(BANK|BNK|BK$)").unwrap());

/// Entity codes shipped by default. Contains-matched against the uppercased
/// sender, so both `VM-HDFCBK` and a bare `HDFCBK` hit.
const BUILTIN_CODES: &[&str] = &[
    "HDFCBK", "ICICIB", "ICICIT", "SBIINB", "SBIPSG", "SBIUPI", "KOTAKB", "AXISBK",
    "PNBSMS", "CANBNK", "BOBTXN", "IDFCFB", "YESBNK", "INDUSB", "FEDBNK", "RBLBNK",
    "IDBIBK", "UNIONB", "CENTBK", "PAYTMB", "PAYTM", "PHONPE", "GPAY", "BHIMPB",
    "AMZNPY", "MOBKWK", "CREDCL", "SLICEB",
];

/// Known financial senders, contains-matched by entity code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderRegistry {
    codes: Vec<String>,
}

impl SenderRegistry {
    /// Registry with the built-in Indian bank/PSP codes.
    pub fn builtin() -> Self {
        Self {
            codes: BUILTIN_CODES.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Load a replacement code list from a YAML file
    /// (`codes: [HDFCBK, ...]`). Codes are uppercased on load.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let mut registry: SenderRegistry =
            serde_yaml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        for code in &mut registry.codes {
            *code = code.trim().to_uppercase();
        }
        registry.codes.retain(|c| !c.is_empty());
        if registry.codes.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "codes".to_string(),
                message: "sender registry must list at least one code".to_string(),
            });
        }
        tracing::info!(codes = registry.codes.len(), path = %path.display(), "Loaded sender registry");
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Whether the sender id looks like a bank or payment provider.
    ///
    /// A known entity code anywhere in the header wins; otherwise a
    /// DLT-shaped header containing a generic banking fragment counts.
    pub fn is_financial_sender(&self, sender: &str) -> bool {
        let normalized = sender.trim().to_uppercase();
        if normalized.is_empty() {
            return false;
        }
        if self.codes.iter().any(|code| normalized.contains(code)) {
            return true;
        }
        HEADER_SHAPE.is_match(&normalized) && BANK_FRAGMENT.is_match(&normalized)
    }
}

impl Default for SenderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn known_bank_headers_match() {
        let registry = SenderRegistry::builtin();
        assert!(registry.is_financial_sender("VM-HDFCBK"));
        assert!(registry.is_financial_sender("AD-ICICIB"));
        assert!(registry.is_financial_sender("kotakb"));
        assert!(registry.is_financial_sender("JM-PAYTMB"));
    }

    #[test]
    fn merchant_promo_headers_do_not_match() {
        let registry = SenderRegistry::builtin();
        assert!(!registry.is_financial_sender("VM-MYNTRA"));
        assert!(!registry.is_financial_sender("AD-DOMINOS"));
        assert!(!registry.is_financial_sender("+919812345678"));
        assert!(!registry.is_financial_sender(""));
    }

    #[test]
    fn unknown_bank_shaped_header_matches_by_fragment() {
        let registry = SenderRegistry::builtin();
        // Not in the code list, but DLT-shaped and carries a bank fragment.
        assert!(registry.is_financial_sender("JX-NEWBNK"));
        assert!(registry.is_financial_sender("VK-GRAMBANK"));
    }

    #[test]
    fn yaml_override_replaces_codes() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(file, "codes:\n  - testpay\n  - DEMOBK").unwrap();

        let registry = SenderRegistry::from_yaml_file(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.is_financial_sender("VM-TESTPAY"));
        assert!(!registry.is_financial_sender("VM-HDFCBK"));
    }

    #[test]
    fn empty_yaml_list_is_rejected() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(file, "codes: []").unwrap();
        assert!(SenderRegistry::from_yaml_file(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_a_not_found_error() {
        let err = SenderRegistry::from_yaml_file("/nonexistent/senders.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
