//! Trust profile model
//!
//! A profile is read from JSON through a loose serde model and validated into
//! typed form before any decode runs. Once built it is only ever read.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use alloy::primitives::{Address, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;

/// How far a contract is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustLevel {
    Internal,
    Protocol,
    Partner,
    Watched,
}

impl TrustLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            TrustLevel::Internal => "INTERNAL",
            TrustLevel::Protocol => "PROTOCOL",
            TrustLevel::Partner => "PARTNER",
            TrustLevel::Watched => "WATCHED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedSelectors {
    /// `"*"`, only accepted on INTERNAL contracts.
    All,
    Only(BTreeSet<Selector>),
}

impl AllowedSelectors {
    pub fn allows(&self, selector: &Selector) -> bool {
        match self {
            AllowedSelectors::All => true,
            AllowedSelectors::Only(set) => set.contains(selector),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedContractConfig {
    pub label: String,
    pub trust_level: TrustLevel,
    pub allowed_selectors: AllowedSelectors,
    pub allowed_selectors_labels: BTreeMap<Selector, String>,
    pub notes: Option<String>,
    /// Reference to an ABI for this contract, resolved by a `ProfileAbiSource`.
    pub abi_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorUsage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub last_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustProfile {
    pub safe_address: Address,
    pub version: u32,
    pub trusted_contracts: BTreeMap<Address, TrustedContractConfig>,
    pub selector_usage_history: BTreeMap<Address, BTreeMap<Selector, SelectorUsage>>,
}

impl TrustProfile {
    /// Parse and validate a profile document.
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let raw: RawTrustProfile = serde_json::from_str(json)
            .map_err(|e| DecodeError::validation(format!("trust profile is not valid JSON: {e}")))?;
        Self::try_from(raw)
    }

    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let raw: RawTrustProfile = serde_json::from_value(value)
            .map_err(|e| DecodeError::validation(format!("trust profile schema: {e}")))?;
        Self::try_from(raw)
    }

    pub fn contract(&self, address: &Address) -> Option<&TrustedContractConfig> {
        self.trusted_contracts.get(address)
    }

    /// Recorded uses of `selector` on `address`, zero when absent.
    pub fn usage_count(&self, address: &Address, selector: &Selector) -> u64 {
        self.selector_usage_history
            .get(address)
            .and_then(|m| m.get(selector))
            .map(|u| u.count)
            .unwrap_or(0)
    }
}

// --- Raw JSON shape ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrustProfile {
    safe_address: Option<String>,
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    trusted_contracts: BTreeMap<String, RawTrustedContract>,
    #[serde(default)]
    selector_usage_history: BTreeMap<String, BTreeMap<String, SelectorUsage>>,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrustedContract {
    #[serde(default)]
    label: String,
    trust_level: TrustLevel,
    #[serde(default)]
    allowed_selectors: Value,
    #[serde(default)]
    allowed_selectors_labels: BTreeMap<String, String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    abi_path: Option<String>,
}

impl TryFrom<RawTrustProfile> for TrustProfile {
    type Error = DecodeError;

    fn try_from(raw: RawTrustProfile) -> Result<Self, Self::Error> {
        let safe_address = raw
            .safe_address
            .as_deref()
            .ok_or_else(|| DecodeError::validation("trust profile is missing safeAddress"))
            .and_then(|s| parse_address(s).map_err(|e| prefixed("safeAddress", e)))?;

        let mut trusted_contracts = BTreeMap::new();
        for (key, contract) in raw.trusted_contracts {
            let address = parse_address(&key).map_err(|e| prefixed("trustedContracts key", e))?;
            let config = validate_contract(&key, contract)?;
            if trusted_contracts.insert(address, config).is_some() {
                return Err(DecodeError::validation(format!(
                    "trustedContracts lists {address} more than once"
                )));
            }
        }

        let mut selector_usage_history = BTreeMap::new();
        for (key, usage) in raw.selector_usage_history {
            let address =
                parse_address(&key).map_err(|e| prefixed("selectorUsageHistory key", e))?;
            let mut per_selector = BTreeMap::new();
            for (sel, entry) in usage {
                per_selector.insert(parse_selector(&sel)?, entry);
            }
            selector_usage_history.insert(address, per_selector);
        }

        Ok(TrustProfile {
            safe_address,
            version: raw.version,
            trusted_contracts,
            selector_usage_history,
        })
    }
}

fn validate_contract(
    key: &str,
    raw: RawTrustedContract,
) -> Result<TrustedContractConfig, DecodeError> {
    let allowed_selectors = match &raw.allowed_selectors {
        Value::String(s) if s == "*" => {
            if raw.trust_level != TrustLevel::Internal {
                return Err(DecodeError::validation(format!(
                    "{key}: allowedSelectors \"*\" is only valid for INTERNAL contracts"
                )));
            }
            AllowedSelectors::All
        }
        Value::Array(items) => {
            let mut set = BTreeSet::new();
            for item in items {
                let s = item.as_str().ok_or_else(|| {
                    DecodeError::validation(format!("{key}: allowedSelectors entries must be strings"))
                })?;
                set.insert(parse_selector(s)?);
            }
            AllowedSelectors::Only(set)
        }
        Value::Null => AllowedSelectors::Only(BTreeSet::new()),
        other => {
            return Err(DecodeError::validation(format!(
                "{key}: allowedSelectors must be an array or \"*\", got {other}"
            )))
        }
    };

    let mut allowed_selectors_labels = BTreeMap::new();
    for (sel, label) in raw.allowed_selectors_labels {
        allowed_selectors_labels.insert(parse_selector(&sel)?, label);
    }

    Ok(TrustedContractConfig {
        label: raw.label,
        trust_level: raw.trust_level,
        allowed_selectors,
        allowed_selectors_labels,
        notes: raw.notes,
        abi_path: raw.abi_path,
    })
}

fn prefixed(field: &str, err: DecodeError) -> DecodeError {
    match err {
        DecodeError::Validation(msg) => DecodeError::validation(format!("{field}: {msg}")),
        other => other,
    }
}

/// Parse a 20-byte hex address, with or without checksum casing.
pub fn parse_address(s: &str) -> Result<Address, DecodeError> {
    let trimmed = s.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DecodeError::validation(format!("invalid address '{s}'")));
    }
    Address::from_str(hex).map_err(|e| DecodeError::validation(format!("invalid address '{s}': {e}")))
}

/// Parse a `0x`-prefixed 4-byte selector.
pub fn parse_selector(s: &str) -> Result<Selector, DecodeError> {
    let trimmed = s.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| DecodeError::validation(format!("selector '{s}' must start with 0x")))?;
    if hex.len() != 8 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DecodeError::validation(format!("invalid selector '{s}'")));
    }
    Selector::from_str(hex).map_err(|e| DecodeError::validation(format!("invalid selector '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector() {
        let sel = parse_selector("0x095EA7B3").unwrap();
        assert_eq!(sel.to_string(), "0x095ea7b3");
        assert!(parse_selector("095ea7b3").is_err());
        assert!(parse_selector("0x095ea7").is_err());
    }

    #[test]
    fn test_parse_address() {
        assert!(parse_address("0xd8da6bf26964af9d7eed9e03e53415d37aa96045").is_ok());
        assert!(parse_address("0xd8da6bf26964af9d7eed9e03e53415d37aa9604").is_err());
        assert!(parse_address("not-an-address").is_err());
    }

    #[test]
    fn test_usage_count_defaults_to_zero() {
        let profile = TrustProfile::from_json(
            r#"{"safeAddress":"0x1000000000000000000000000000000000000001"}"#,
        )
        .unwrap();
        let addr = parse_address("0x2000000000000000000000000000000000000002").unwrap();
        let sel = parse_selector("0x617ba037").unwrap();
        assert_eq!(profile.usage_count(&addr, &sel), 0);
        assert_eq!(profile.version, 1);
    }
}
