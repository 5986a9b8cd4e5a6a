mod common;

use rusty_safe_effects::{DecodeOptions, TrustLevel, TrustProfile};
use serde_json::json;

use common::*;

fn rejected(profile: serde_json::Value) -> String {
    let err = DecodeOptions::offline()
        .with_profile_json(&profile.to_string())
        .expect_err("profile should be rejected");
    assert_eq!(err.code(), "VALIDATION_ERROR");
    err.to_string()
}

#[test]
fn fixture_profile_loads() {
    let profile = TrustProfile::from_json(&profile_json()).expect("profile");
    assert_eq!(profile.safe_address, SAFE);
    assert_eq!(profile.version, 2);
    assert_eq!(profile.trusted_contracts.len(), 4);
    assert_eq!(
        profile.contract(&AAVE_POOL).map(|c| c.trust_level),
        Some(TrustLevel::Protocol)
    );
    assert_eq!(
        profile
            .contract(&VAULT)
            .and_then(|c| c.abi_path.as_deref()),
        Some("abis/vault.json")
    );
}

#[test]
fn missing_safe_address_is_rejected() {
    let msg = rejected(json!({ "trustedContracts": {} }));
    assert!(msg.contains("safeAddress"));
}

#[test]
fn malformed_address_key_is_rejected() {
    let msg = rejected(json!({
        "safeAddress": SAFE,
        "trustedContracts": {
            "0x1234": { "label": "x", "trustLevel": "PARTNER", "allowedSelectors": [] }
        }
    }));
    assert!(msg.contains("0x1234"));
}

#[test]
fn non_array_allowed_selectors_is_rejected() {
    rejected(json!({
        "safeAddress": SAFE,
        "trustedContracts": {
            USDC.to_string(): { "label": "USDC", "trustLevel": "PARTNER", "allowedSelectors": 7 }
        }
    }));
    rejected(json!({
        "safeAddress": SAFE,
        "trustedContracts": {
            USDC.to_string(): { "label": "USDC", "trustLevel": "PARTNER", "allowedSelectors": "all" }
        }
    }));
}

#[test]
fn wildcard_is_internal_only() {
    let msg = rejected(json!({
        "safeAddress": SAFE,
        "trustedContracts": {
            USDC.to_string(): { "label": "USDC", "trustLevel": "PROTOCOL", "allowedSelectors": "*" }
        }
    }));
    assert!(msg.contains("INTERNAL"));
}

#[test]
fn malformed_selector_is_rejected() {
    rejected(json!({
        "safeAddress": SAFE,
        "trustedContracts": {
            USDC.to_string(): { "label": "USDC", "trustLevel": "PARTNER", "allowedSelectors": ["0x1234"] }
        }
    }));
}

#[test]
fn unknown_trust_level_is_rejected() {
    rejected(json!({
        "safeAddress": SAFE,
        "trustedContracts": {
            USDC.to_string(): { "label": "USDC", "trustLevel": "FRIEND", "allowedSelectors": [] }
        }
    }));
}

#[test]
fn duplicate_addresses_in_different_case_are_rejected() {
    let lower = USDC.to_string().to_lowercase();
    let checksummed = USDC.to_string();
    let msg = rejected(json!({
        "safeAddress": SAFE,
        "trustedContracts": {
            lower: { "label": "a", "trustLevel": "PARTNER", "allowedSelectors": [] },
            checksummed: { "label": "b", "trustLevel": "PARTNER", "allowedSelectors": [] }
        }
    }));
    assert!(msg.contains("more than once"));
}
