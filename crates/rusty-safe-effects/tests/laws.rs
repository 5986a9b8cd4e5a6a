mod common;

use alloy::primitives::{hex, Address, U256};
use rusty_safe_effects::{
    explain, ContractClassification, DecodeOptions, Operation, Severity, Source,
};

use common::*;

fn sample_calls() -> Vec<String> {
    vec![
        approve_max(PERMIT2),
        format!("0x{}", hex::encode(transfer(STRANGER, 5))),
        format!("0x{}", hex::encode(aave_supply(9))),
        hex_call("enableModule(address)", &[addr(STRANGER)]),
        hex_call("upgradeTo(address)", &[addr(STRANGER)]),
        "0xdeadbeef".to_owned(),
    ]
}

#[tokio::test]
async fn identical_inputs_serialize_identically() {
    let batch = multisend(&[
        record(Operation::Call, USDC, 0, transfer(STRANGER, 1)),
        record(Operation::Call, AAVE_POOL, 0, aave_supply(3)),
    ]);
    let mut inputs = sample_calls();
    inputs.push(batch);

    for calldata in inputs {
        for target in [AAVE_POOL, USDC, STRANGER] {
            let options = options_with_profile(target);
            let first = decoder().decode(&calldata, &options).await.expect("decode");
            let second = decoder().decode(&calldata, &options).await.expect("decode");
            assert_eq!(
                serde_json::to_string(&first).expect("json"),
                serde_json::to_string(&second).expect("json"),
                "{calldata} -> {target}"
            );
        }
    }
}

#[tokio::test]
async fn catalog_selectors_always_report_verified_database() {
    let registry = std::sync::Arc::new(MemoryRegistry::default().with(1, USDC, erc20_abi()));
    let decoder = rusty_safe_effects::Decoder::default().with_registry(registry);
    for calldata in [
        approve_max(PERMIT2),
        format!("0x{}", hex::encode(transfer(STRANGER, 5))),
        hex_call("setGuard(address)", &[addr(Address::ZERO)]),
    ] {
        for options in [options(), options_with_profile(USDC), options_with_profile(STRANGER)] {
            let result = decoder.decode(&calldata, &options).await.expect("decode");
            assert_eq!(result.analysis.source, Some(Source::VerifiedDatabase), "{calldata}");
            assert!(result.analysis.verified);
        }
    }
}

#[tokio::test]
async fn targets_outside_profile_are_blocked() {
    let outsiders = [STRANGER, PERMIT2, SAFE, Address::ZERO, Address::repeat_byte(0x42)];
    for calldata in sample_calls() {
        for target in outsiders {
            let result = decoder()
                .decode(&calldata, &options_with_profile(target))
                .await
                .expect("decode");
            let trust = &result.analysis.trust_context;
            assert_eq!(trust.contract_classification, ContractClassification::Unknown);
            assert!(trust.trust_blocked);
            assert_eq!(result.analysis.header_severity, Severity::Unknown, "{calldata}");
            assert!(explain(&result).skip_ai);
        }
    }
}

#[tokio::test]
async fn delegatecall_outside_allow_list_is_critical() {
    for calldata in sample_calls() {
        for options in [
            options().with_target(USDC),
            options(),
            options_with_profile(AAVE_POOL),
            options_with_profile(STRANGER),
        ] {
            let options = options.with_operation(Operation::Delegatecall);
            let result = decoder().decode(&calldata, &options).await.expect("decode");
            assert_eq!(result.analysis.effect.severity, Severity::Critical, "{calldata}");
            assert!(result.analysis.effect.delegatecall_override);
            assert!(result.analysis.effect.warnings[0].contains("full permissions"));
        }
    }
}

#[tokio::test]
async fn blocked_delegatecall_keeps_both_laws() {
    let options = options_with_profile(STRANGER).with_operation(Operation::Delegatecall);
    let result = decoder().decode(&approve_max(PERMIT2), &options).await.expect("decode");
    assert_eq!(result.analysis.effect.severity, Severity::Critical);
    assert_eq!(result.analysis.header_severity, Severity::Unknown);
}

#[tokio::test]
async fn no_profile_leaves_trust_context_inert() {
    for calldata in sample_calls() {
        let plain = decoder().decode(&calldata, &options().with_target(USDC)).await.expect("decode");
        let trust = &plain.analysis.trust_context;
        assert!(!trust.profile_loaded);
        assert!(!trust.trust_blocked);
        assert_eq!(trust.selector_classification, None);
        assert!(trust.warnings.is_empty());
    }
}

#[tokio::test]
async fn result_serializes_with_wire_names() {
    let result = decoder()
        .decode(&approve_max(PERMIT2), &options().with_value(U256::ZERO))
        .await
        .expect("decode");
    let json = serde_json::to_value(&result).expect("json");

    assert_eq!(json["source"], "VERIFIED_DATABASE");
    assert_eq!(json["verified"], true);
    assert_eq!(json["headerSeverity"], "CRITICAL");
    assert_eq!(json["isBatch"], false);
    assert!(json["batchInfo"].is_null());
    assert_eq!(json["effect"]["permanence"], "PERMANENT_UNTIL_REVOKED");
    assert_eq!(json["params"][1]["type"], "uint256");
    assert_eq!(json["params"][1]["unlimited"], true);
    assert_eq!(json["trustContext"]["profileLoaded"], false);

    let batch = multisend(&[record(Operation::Call, USDC, 0, transfer(STRANGER, 1))]);
    let result = decoder()
        .decode(&batch, &DecodeOptions::offline().with_target(MULTISEND_CALL_ONLY))
        .await
        .expect("decode");
    let json = serde_json::to_value(&result).expect("json");
    assert_eq!(json["batchInfo"]["batchSummary"]["counts"]["WARN"], 1);
    assert_eq!(json["batchInfo"]["calls"][0]["operationLabel"], "CALL");
}
