//! Consequence and severity model
//!
//! Each `EffectTemplate` maps to one handler that describes what changes,
//! who gains capability, how reversible it is, and a base severity. Trust and
//! operation rules are layered on top in a fixed order:
//!
//! 1. template (or the unresolved short-circuit)
//! 2. trust profile adjustments
//! 3. DELEGATECALL override, which always wins on `severity`

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};

use crate::types::{
    BatchInfo, DecodedParam, EffectCategory, EffectModel, EffectTemplate, Operation, ParamsExt,
    Permanence, SelectorClassification, Severity, Source, TrustContext,
};

pub const DELEGATECALL_NOTICE: &str =
    "DELEGATECALL executes the target's code with the Safe's full permissions and storage";
pub const UNRESOLVED_NOTICE: &str =
    "Function could not be identified from a trusted source; its consequences cannot be determined";
pub const SINGLE_SIGNER_NOTICE: &str =
    "A threshold of 1 lets any single owner execute arbitrary transactions";

/// What is being called.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    /// Empty calldata: a plain value transfer.
    NativeTransfer,
    Function {
        name: &'a str,
        source: Source,
        template: EffectTemplate,
        params: Option<&'a [DecodedParam]>,
    },
    /// No trusted source matched. `hint` carries an untrusted name, if any.
    Unresolved { hint: Option<&'a str> },
}

#[derive(Debug, Clone, Copy)]
pub struct EffectInput<'a> {
    pub subject: Subject<'a>,
    pub trust: &'a TrustContext,
    pub operation: Operation,
    pub target: Option<Address>,
    pub value: U256,
    /// The Safe executing the call, when a profile names it.
    pub safe_address: Option<Address>,
    pub delegatecall_allowed: bool,
    /// Expanded sub-calls when the subject is a top-level batch.
    pub batch: Option<&'a BatchInfo>,
}

/// Facts a template handler reads.
struct Facts<'a> {
    name: &'a str,
    params: &'a [DecodedParam],
    target: Option<Address>,
    value: U256,
    safe_address: Option<Address>,
    batch: Option<&'a BatchInfo>,
}

type Handler = fn(&Facts<'_>) -> EffectModel;

pub fn analyze(input: &EffectInput<'_>) -> EffectModel {
    let mut effect = match input.subject {
        Subject::Unresolved { hint } => unresolved(hint),
        Subject::NativeTransfer => {
            let facts = facts(input, "transfer", &[]);
            native_transfer(&facts)
        }
        Subject::Function {
            name,
            source,
            template,
            params,
        } => {
            let facts = facts(input, name, params.unwrap_or(&[]));
            let mut effect = handler(template)(&facts);
            if !source.has_abi() {
                effect.warnings.push(
                    "Identified by a trust-profile label only; parameters were not decoded".to_owned(),
                );
            } else if params.is_none() && needs_params(template) {
                effect.warnings.push(
                    "Parameters could not be decoded; amounts and recipients are unknown".to_owned(),
                );
            }
            if !input.value.is_zero() && template != EffectTemplate::NativeTransfer {
                effect
                    .consequences
                    .push(format!("Also sends {} wei to {}", input.value, fmt_addr(input.target)));
            }
            effect
        }
    };

    apply_trust(&mut effect, input);
    apply_operation(&mut effect, input);
    effect
}

fn facts<'a>(input: &EffectInput<'a>, name: &'a str, params: &'a [DecodedParam]) -> Facts<'a> {
    Facts {
        name,
        params,
        target: input.target,
        value: input.value,
        safe_address: input.safe_address,
        batch: input.batch,
    }
}

fn handler(template: EffectTemplate) -> Handler {
    use EffectTemplate::*;
    match template {
        Approve => approve,
        IncreaseAllowance => increase_allowance,
        DecreaseAllowance => decrease_allowance,
        Permit => permit,
        SetApprovalForAll => set_approval_for_all,
        Transfer => transfer,
        TransferFrom => transfer_from,
        NftTransfer => nft_transfer,
        NativeTransfer => native_transfer,
        SwapV2 => swap_v2,
        SwapV3Single => swap_v3_single,
        TransferOwnership => transfer_ownership,
        RenounceOwnership => renounce_ownership,
        UpgradeTo => upgrade_to,
        UpgradeToAndCall => upgrade_to_and_call,
        ChangeProxyAdmin => change_proxy_admin,
        AddOwner => add_owner,
        RemoveOwner => remove_owner,
        SwapOwner => swap_owner,
        ChangeThreshold => change_threshold,
        EnableModule => enable_module,
        DisableModule => disable_module,
        SetGuard => set_guard,
        SetFallbackHandler => set_fallback_handler,
        MultiSend => multi_send,
        GenericCall => generic_call,
    }
}

fn needs_params(template: EffectTemplate) -> bool {
    !matches!(
        template,
        EffectTemplate::RenounceOwnership | EffectTemplate::NativeTransfer | EffectTemplate::GenericCall
    )
}

// --- Adjustments ---

fn apply_trust(effect: &mut EffectModel, input: &EffectInput<'_>) {
    let trust = input.trust;
    if !trust.profile_loaded {
        return;
    }

    if trust.trust_blocked {
        effect.severity = Severity::Unknown;
        effect.consequences.clear();
        effect.warnings = vec![format!(
            "Unverified target: {} is not in the trust profile, so its behaviour cannot be assumed",
            fmt_addr(input.target)
        )];
        effect.mitigations = vec![
            "Verify the contract independently before adding it to the trust profile".to_owned(),
        ];
        return;
    }

    match trust.selector_classification {
        Some(SelectorClassification::NotAllowed) => effect.severity = Severity::Critical,
        Some(SelectorClassification::NeverUsed | SelectorClassification::Unusual) => {
            effect.severity = effect.severity.escalate();
        }
        Some(SelectorClassification::Expected) | None => {}
    }
    effect.warnings.extend(trust.warnings.iter().cloned());
}

fn apply_operation(effect: &mut EffectModel, input: &EffectInput<'_>) {
    if input.operation != Operation::Delegatecall || input.delegatecall_allowed {
        return;
    }
    effect.severity = Severity::Critical;
    effect.delegatecall_override = true;
    effect.warnings.insert(0, DELEGATECALL_NOTICE.to_owned());
    effect.mitigations.push(
        "Use CALL unless the target is an audited library built for DELEGATECALL".to_owned(),
    );
}

// --- Templates ---

fn model(
    effect_type: EffectCategory,
    label: impl Into<String>,
    permanence: Permanence,
    severity: Severity,
) -> EffectModel {
    EffectModel {
        effect_type,
        label: label.into(),
        permanence,
        beneficiary: None,
        consequences: Vec::new(),
        warnings: Vec::new(),
        mitigations: Vec::new(),
        severity,
        delegatecall_override: false,
    }
}

fn unresolved(hint: Option<&str>) -> EffectModel {
    let label = match hint {
        Some(name) => format!("Unverified function {name} (name from an untrusted lookup)"),
        None => "Unknown function".to_owned(),
    };
    let mut effect = model(EffectCategory::ContractCall, label, Permanence::Immediate, Severity::Unknown);
    effect.warnings.push(UNRESOLVED_NOTICE.to_owned());
    effect
}

fn approve(f: &Facts<'_>) -> EffectModel {
    allowance_grant(f.params.address_at(0), f.params.param(1), "Token approval")
}

fn increase_allowance(f: &Facts<'_>) -> EffectModel {
    allowance_grant(f.params.address_at(0), f.params.param(1), "Allowance increase")
}

fn allowance_grant(
    spender: Option<Address>,
    amount: Option<&DecodedParam>,
    label: &str,
) -> EffectModel {
    let spender_s = fmt_addr(spender);
    let mut effect = match amount {
        Some(p) if p.unlimited => {
            let mut e = model(
                EffectCategory::Approval,
                format!("Unlimited {}", label.to_lowercase()),
                Permanence::PermanentUntilRevoked,
                Severity::Critical,
            );
            e.consequences.push(format!(
                "Grants {spender_s} unlimited spending of this token from the Safe"
            ));
            e.consequences.push("Amount: unlimited".to_owned());
            e.consequences.push(
                "The spender can move the full balance, including future deposits, until the approval is revoked"
                    .to_owned(),
            );
            e.mitigations.push("Approve only the exact amount needed".to_owned());
            e.mitigations.push("Revoke the allowance once it has been used".to_owned());
            e
        }
        Some(p) if p.as_uint().is_some_and(|v| v.is_zero()) => {
            let mut e = model(
                EffectCategory::Approval,
                "Approval revoked",
                Permanence::Immediate,
                Severity::Ok,
            );
            e.consequences
                .push(format!("Sets {spender_s}'s allowance for this token to zero"));
            e
        }
        Some(p) => {
            let mut e = model(EffectCategory::Approval, label, Permanence::Temporary, Severity::Danger);
            e.consequences.push(format!(
                "Allows {spender_s} to spend up to {} units of this token from the Safe",
                p.value
            ));
            e.consequences
                .push("The allowance remains until it is spent or changed".to_owned());
            e.mitigations.push("Revoke any unused allowance after the operation".to_owned());
            e
        }
        None => {
            let mut e = model(
                EffectCategory::Approval,
                label,
                Permanence::PermanentUntilRevoked,
                Severity::Critical,
            );
            e.consequences.push(format!(
                "Grants {spender_s} an unknown allowance; treat it as unlimited"
            ));
            e
        }
    };
    effect.beneficiary = spender;
    effect
}

fn decrease_allowance(f: &Facts<'_>) -> EffectModel {
    let spender = f.params.address_at(0);
    let mut e = model(
        EffectCategory::Approval,
        "Allowance decrease",
        Permanence::Immediate,
        Severity::Ok,
    );
    e.consequences.push(format!(
        "Reduces {}'s allowance by {}",
        fmt_addr(spender),
        fmt_amount(f.params.param(1))
    ));
    e
}

fn permit(f: &Facts<'_>) -> EffectModel {
    let mut e = allowance_grant(f.params.address_at(1), f.params.param(2), "Permit");
    e.consequences.push(format!(
        "Submits an off-chain signed allowance from owner {}",
        fmt_addr(f.params.address_at(0))
    ));
    e
}

fn set_approval_for_all(f: &Facts<'_>) -> EffectModel {
    let operator = f.params.address_at(0);
    let approved = f.params.param(1).and_then(DecodedParam::as_bool);
    if approved == Some(false) {
        let mut e = model(
            EffectCategory::Approval,
            "Operator revoked",
            Permanence::Immediate,
            Severity::Ok,
        );
        e.consequences
            .push(format!("Revokes {} as operator for this collection", fmt_addr(operator)));
        return e;
    }
    let mut e = model(
        EffectCategory::Approval,
        "Operator approval for all tokens",
        Permanence::PermanentUntilRevoked,
        Severity::Critical,
    );
    e.beneficiary = operator;
    e.consequences.push(format!(
        "Grants {} control over every token of this collection held by the Safe",
        fmt_addr(operator)
    ));
    e.mitigations
        .push("Revoke the operator with setApprovalForAll(operator, false) after use".to_owned());
    e
}

fn transfer(f: &Facts<'_>) -> EffectModel {
    let to = f.params.address_at(0);
    let mut e = model(EffectCategory::Transfer, "Token transfer", Permanence::Immediate, Severity::Warn);
    e.beneficiary = to;
    e.consequences.push(format!(
        "Sends {} units of this token from the Safe to {}",
        fmt_amount(f.params.param(1)),
        fmt_addr(to)
    ));
    e
}

fn transfer_from(f: &Facts<'_>) -> EffectModel {
    let from = f.params.address_at(0);
    let to = f.params.address_at(1);
    let mut e = model(
        EffectCategory::Transfer,
        "Token transfer from",
        Permanence::Immediate,
        Severity::Warn,
    );
    e.beneficiary = to;
    e.consequences.push(format!(
        "Moves {} units of this token from {} to {}",
        fmt_amount(f.params.param(2)),
        fmt_addr(from),
        fmt_addr(to)
    ));
    if from.is_some() && from != f.safe_address {
        e.consequences
            .push("Spends an allowance the sender granted to the Safe".to_owned());
    }
    e
}

fn nft_transfer(f: &Facts<'_>) -> EffectModel {
    let to = f.params.address_at(1);
    let mut e = model(EffectCategory::Transfer, "NFT transfer", Permanence::Immediate, Severity::Warn);
    e.beneficiary = to;
    e.consequences.push(format!(
        "Transfers token #{} from {} to {}",
        fmt_amount(f.params.param(2)),
        fmt_addr(f.params.address_at(0)),
        fmt_addr(to)
    ));
    e
}

fn native_transfer(f: &Facts<'_>) -> EffectModel {
    if f.value.is_zero() {
        let mut e = model(EffectCategory::Transfer, "Empty call", Permanence::Immediate, Severity::Ok);
        e.consequences
            .push(format!("Calls {} with no value and no data", fmt_addr(f.target)));
        return e;
    }
    let mut e = model(
        EffectCategory::Transfer,
        "Native transfer",
        Permanence::Immediate,
        Severity::Warn,
    );
    e.beneficiary = f.target;
    e.consequences
        .push(format!("Sends {} wei from the Safe to {}", f.value, fmt_addr(f.target)));
    e
}

fn swap_v2(f: &Facts<'_>) -> EffectModel {
    let recipient = f
        .params
        .iter()
        .find(|p| p.name == "to")
        .and_then(DecodedParam::as_address);
    swap(f, recipient)
}

fn swap_v3_single(f: &Facts<'_>) -> EffectModel {
    // ExactInputSingleParams.recipient
    let recipient = f.params.param(0).and_then(|p| match &p.raw {
        DynSolValue::Tuple(items) => items.get(3).and_then(DynSolValue::as_address),
        _ => None,
    });
    swap(f, recipient)
}

fn swap(f: &Facts<'_>, recipient: Option<Address>) -> EffectModel {
    let mut e = model(EffectCategory::Dex, "Token swap", Permanence::Immediate, Severity::Warn);
    e.beneficiary = recipient;
    e.consequences.push(format!(
        "Swaps tokens held by the Safe through {} ({})",
        fmt_addr(f.target),
        f.name
    ));
    e.consequences
        .push(format!("Swap output is delivered to {}", fmt_addr(recipient)));
    match (recipient, f.safe_address) {
        (Some(r), Some(safe)) if r != safe => {
            e.severity = Severity::Danger;
            e.warnings
                .push(format!("Swap output goes to {r}, not to the Safe {safe}"));
        }
        (_, None) => e
            .mitigations
            .push("Confirm the swap recipient is the Safe itself".to_owned()),
        _ => {}
    }
    e.mitigations
        .push("Check the minimum output amount against current prices".to_owned());
    e
}

fn transfer_ownership(f: &Facts<'_>) -> EffectModel {
    let new_owner = f.params.address_at(0);
    let mut e = model(
        EffectCategory::Ownership,
        "Ownership transfer",
        Permanence::Permanent,
        Severity::Critical,
    );
    e.beneficiary = new_owner;
    e.consequences.push(format!(
        "Transfers ownership of {} to {}",
        fmt_addr(f.target),
        fmt_addr(new_owner)
    ));
    e.consequences
        .push("The current owner loses every owner-only privilege".to_owned());
    e
}

fn renounce_ownership(f: &Facts<'_>) -> EffectModel {
    let mut e = model(
        EffectCategory::Ownership,
        "Ownership renounced",
        Permanence::Permanent,
        Severity::Critical,
    );
    e.consequences
        .push(format!("Removes the owner of {} permanently", fmt_addr(f.target)));
    e.consequences
        .push("Owner-only functions become unusable for everyone".to_owned());
    e
}

fn upgrade_to(f: &Facts<'_>) -> EffectModel {
    let implementation = f.params.address_at(0);
    let mut e = model(
        EffectCategory::ProxyUpgrade,
        "Proxy upgrade",
        Permanence::Permanent,
        Severity::Critical,
    );
    e.beneficiary = implementation;
    e.consequences.push(format!(
        "Replaces the implementation behind {} with {}",
        fmt_addr(f.target),
        fmt_addr(implementation)
    ));
    e.consequences.push(
        "All future calls run the new code, which can change any behaviour or move held funds"
            .to_owned(),
    );
    e.mitigations
        .push("Verify the new implementation's source and audit before signing".to_owned());
    e
}

fn upgrade_to_and_call(f: &Facts<'_>) -> EffectModel {
    let mut e = upgrade_to(f);
    e.label = "Proxy upgrade with call".to_owned();
    e.consequences.push(format!(
        "Immediately executes {} against the new implementation",
        f.params
            .param(1)
            .map(|p| p.value.clone())
            .unwrap_or_else(|| "unknown initialization data".to_owned())
    ));
    e
}

fn change_proxy_admin(f: &Facts<'_>) -> EffectModel {
    let admin = f.params.address_at(0);
    let mut e = model(
        EffectCategory::ProxyUpgrade,
        "Proxy admin change",
        Permanence::Permanent,
        Severity::Critical,
    );
    e.beneficiary = admin;
    e.consequences.push(format!(
        "Hands the right to upgrade {} to {}",
        fmt_addr(f.target),
        fmt_addr(admin)
    ));
    e
}

fn add_owner(f: &Facts<'_>) -> EffectModel {
    let owner = f.params.address_at(0);
    let mut e = model(EffectCategory::SafeAdmin, "Add Safe owner", Permanence::Permanent, Severity::High);
    e.beneficiary = owner;
    e.consequences
        .push(format!("Adds {} as an owner of the Safe", fmt_addr(owner)));
    threshold_consequence(&mut e, f.params.uint_at(1));
    e
}

fn remove_owner(f: &Facts<'_>) -> EffectModel {
    let mut e = model(
        EffectCategory::SafeAdmin,
        "Remove Safe owner",
        Permanence::Permanent,
        Severity::High,
    );
    e.consequences.push(format!(
        "Removes {} from the Safe owners",
        fmt_addr(f.params.address_at(1))
    ));
    threshold_consequence(&mut e, f.params.uint_at(2));
    e
}

fn swap_owner(f: &Facts<'_>) -> EffectModel {
    let new_owner = f.params.address_at(2);
    let mut e = model(EffectCategory::SafeAdmin, "Swap Safe owner", Permanence::Permanent, Severity::High);
    e.beneficiary = new_owner;
    e.consequences.push(format!(
        "Replaces owner {} with {}",
        fmt_addr(f.params.address_at(1)),
        fmt_addr(new_owner)
    ));
    e
}

fn change_threshold(f: &Facts<'_>) -> EffectModel {
    let mut e = model(
        EffectCategory::SafeAdmin,
        "Change signature threshold",
        Permanence::Permanent,
        Severity::High,
    );
    threshold_consequence(&mut e, f.params.uint_at(0));
    e
}

fn threshold_consequence(e: &mut EffectModel, threshold: Option<U256>) {
    match threshold {
        Some(t) => {
            e.consequences
                .push(format!("Sets the signature threshold to {t}"));
            if t == U256::from(1) {
                e.severity = Severity::Critical;
                e.warnings.push(SINGLE_SIGNER_NOTICE.to_owned());
            }
        }
        None => e
            .consequences
            .push("Sets the signature threshold to an unknown value".to_owned()),
    }
}

fn enable_module(f: &Facts<'_>) -> EffectModel {
    let module = f.params.address_at(0);
    let mut e = model(
        EffectCategory::SafeAdmin,
        "Enable Safe module",
        Permanence::PermanentUntilRevoked,
        Severity::Critical,
    );
    e.beneficiary = module;
    e.consequences.push(format!(
        "Enables module {}, which can execute transactions from the Safe without owner signatures",
        fmt_addr(module)
    ));
    e.mitigations
        .push("Only enable audited modules and disable them when no longer needed".to_owned());
    e
}

fn disable_module(f: &Facts<'_>) -> EffectModel {
    let mut e = model(
        EffectCategory::SafeAdmin,
        "Disable Safe module",
        Permanence::Permanent,
        Severity::Warn,
    );
    e.consequences.push(format!(
        "Disables module {}",
        fmt_addr(f.params.address_at(1))
    ));
    e
}

fn set_guard(f: &Facts<'_>) -> EffectModel {
    let guard = f.params.address_at(0);
    if guard == Some(Address::ZERO) {
        let mut e = model(
            EffectCategory::SafeAdmin,
            "Remove transaction guard",
            Permanence::PermanentUntilRevoked,
            Severity::High,
        );
        e.consequences
            .push("Removes the guard; transactions are no longer checked before execution".to_owned());
        return e;
    }
    let mut e = model(
        EffectCategory::SafeAdmin,
        "Set transaction guard",
        Permanence::PermanentUntilRevoked,
        Severity::High,
    );
    e.beneficiary = guard;
    e.consequences.push(format!(
        "Installs {} as transaction guard; a faulty guard can block every future transaction",
        fmt_addr(guard)
    ));
    e
}

fn set_fallback_handler(f: &Facts<'_>) -> EffectModel {
    let handler = f.params.address_at(0);
    let mut e = model(
        EffectCategory::SafeAdmin,
        "Set fallback handler",
        Permanence::PermanentUntilRevoked,
        Severity::High,
    );
    e.beneficiary = handler;
    e.consequences.push(format!(
        "Routes calls the Safe does not implement to {}",
        fmt_addr(handler)
    ));
    e.consequences
        .push("The handler can validate signatures on the Safe's behalf (EIP-1271)".to_owned());
    e
}

fn multi_send(f: &Facts<'_>) -> EffectModel {
    let Some(batch) = f.batch else {
        let mut e = model(
            EffectCategory::Batch,
            "Nested batch (not expanded)",
            Permanence::Immediate,
            Severity::Danger,
        );
        e.warnings.push(
            "Nested batches are analysed only at the call level; inner calls were not decoded"
                .to_owned(),
        );
        return e;
    };

    let mut e = model(
        EffectCategory::Batch,
        format!("Batch of {} calls", batch.call_count),
        Permanence::Immediate,
        batch.batch_summary.overall_severity,
    );
    for call in &batch.calls {
        e.consequences.push(format!(
            "#{} {} {}: {} [{}]",
            call.index + 1,
            call.operation_label.as_str(),
            call.to,
            call.analysis.effect.label,
            call.analysis.header_severity
        ));
    }
    if batch.calls.is_empty() {
        e.warnings.push("Batch contains no calls".to_owned());
    } else {
        e.warnings
            .push("Calls execute atomically and in the order listed".to_owned());
    }
    e
}

fn generic_call(f: &Facts<'_>) -> EffectModel {
    let mut e = model(
        EffectCategory::ContractCall,
        format!("{} call", f.name),
        Permanence::Immediate,
        Severity::Warn,
    );
    e.consequences.push(format!(
        "Executes {} on {}; its effects depend on the contract's code",
        f.name,
        fmt_addr(f.target)
    ));
    e
}

// --- Formatting ---

fn fmt_addr(addr: Option<Address>) -> String {
    addr.map(|a| a.to_string())
        .unwrap_or_else(|| "an unknown address".to_owned())
}

fn fmt_amount(param: Option<&DecodedParam>) -> String {
    match param {
        Some(p) if p.unlimited => "unlimited".to_owned(),
        Some(p) => p.value.clone(),
        None => "an unknown amount of".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrustContext;

    fn uint(name: &str, v: U256) -> DecodedParam {
        DecodedParam {
            name: name.to_owned(),
            typ: "uint256".to_owned(),
            value: v.to_string(),
            unlimited: v == U256::MAX,
            raw: DynSolValue::Uint(v, 256),
        }
    }

    fn addr_param(name: &str, a: Address) -> DecodedParam {
        DecodedParam {
            name: name.to_owned(),
            typ: "address".to_owned(),
            value: a.to_string(),
            unlimited: false,
            raw: DynSolValue::Address(a),
        }
    }

    fn input<'a>(
        subject: Subject<'a>,
        trust: &'a TrustContext,
        operation: Operation,
    ) -> EffectInput<'a> {
        EffectInput {
            subject,
            trust,
            operation,
            target: Some(Address::repeat_byte(0xaa)),
            value: U256::ZERO,
            safe_address: None,
            delegatecall_allowed: false,
            batch: None,
        }
    }

    fn approve_subject(params: &[DecodedParam]) -> Subject<'_> {
        Subject::Function {
            name: "approve",
            source: Source::VerifiedDatabase,
            template: EffectTemplate::Approve,
            params: Some(params),
        }
    }

    #[test]
    fn test_unlimited_approval_is_critical_until_revoked() {
        let params = [addr_param("spender", Address::repeat_byte(1)), uint("amount", U256::MAX)];
        let trust = TrustContext::unloaded();
        let effect = analyze(&input(approve_subject(&params), &trust, Operation::Call));
        assert_eq!(effect.severity, Severity::Critical);
        assert_eq!(effect.permanence, Permanence::PermanentUntilRevoked);
        assert!(effect.consequences.iter().any(|c| c.contains("unlimited spending")));
        assert_eq!(effect.beneficiary, Some(Address::repeat_byte(1)));
    }

    #[test]
    fn test_finite_and_zero_approvals() {
        let trust = TrustContext::unloaded();
        let finite = [addr_param("spender", Address::repeat_byte(1)), uint("amount", U256::from(5))];
        let effect = analyze(&input(approve_subject(&finite), &trust, Operation::Call));
        assert_eq!(effect.severity, Severity::Danger);
        assert_eq!(effect.permanence, Permanence::Temporary);

        let zero = [addr_param("spender", Address::repeat_byte(1)), uint("amount", U256::ZERO)];
        let effect = analyze(&input(approve_subject(&zero), &trust, Operation::Call));
        assert_eq!(effect.severity, Severity::Ok);
    }

    #[test]
    fn test_unresolved_short_circuits() {
        let trust = TrustContext::unloaded();
        let effect = analyze(&input(Subject::Unresolved { hint: None }, &trust, Operation::Call));
        assert_eq!(effect.severity, Severity::Unknown);
        assert_eq!(effect.warnings, vec![UNRESOLVED_NOTICE.to_owned()]);
        assert!(effect.consequences.is_empty());
    }

    #[test]
    fn test_delegatecall_forces_critical() {
        let trust = TrustContext::unloaded();
        let params = [addr_param("spender", Address::repeat_byte(1)), uint("amount", U256::ZERO)];
        let effect = analyze(&input(approve_subject(&params), &trust, Operation::Delegatecall));
        assert_eq!(effect.severity, Severity::Critical);
        assert!(effect.delegatecall_override);
        assert_eq!(effect.warnings[0], DELEGATECALL_NOTICE);

        let mut allowed = input(approve_subject(&params), &trust, Operation::Delegatecall);
        allowed.delegatecall_allowed = true;
        let effect = analyze(&allowed);
        assert_eq!(effect.severity, Severity::Ok);
        assert!(!effect.delegatecall_override);
    }

    #[test]
    fn test_trust_escalation_and_blocking() {
        let params = [addr_param("spender", Address::repeat_byte(1)), uint("amount", U256::from(5))];

        let mut never_used = TrustContext::unloaded();
        never_used.profile_loaded = true;
        never_used.contract_classification = crate::types::ContractClassification::Trusted;
        never_used.selector_classification = Some(SelectorClassification::NeverUsed);
        let effect = analyze(&input(approve_subject(&params), &never_used, Operation::Call));
        assert_eq!(effect.severity, Severity::High);

        let mut not_allowed = never_used.clone();
        not_allowed.selector_classification = Some(SelectorClassification::NotAllowed);
        let effect = analyze(&input(approve_subject(&params), &not_allowed, Operation::Call));
        assert_eq!(effect.severity, Severity::Critical);

        let mut blocked = TrustContext::unloaded();
        blocked.profile_loaded = true;
        blocked.trust_blocked = true;
        let effect = analyze(&input(approve_subject(&params), &blocked, Operation::Call));
        assert_eq!(effect.severity, Severity::Unknown);
        assert!(effect.consequences.is_empty());
        assert!(effect.warnings[0].starts_with("Unverified target"));
    }

    #[test]
    fn test_threshold_of_one_is_critical() {
        let trust = TrustContext::unloaded();
        let params = [uint("_threshold", U256::from(1))];
        let subject = Subject::Function {
            name: "changeThreshold",
            source: Source::VerifiedDatabase,
            template: EffectTemplate::ChangeThreshold,
            params: Some(&params),
        };
        let effect = analyze(&input(subject, &trust, Operation::Call));
        assert_eq!(effect.severity, Severity::Critical);
        assert!(effect.warnings.contains(&SINGLE_SIGNER_NOTICE.to_owned()));
    }

    #[test]
    fn test_swap_to_foreign_recipient() {
        let trust = TrustContext::unloaded();
        let stranger = Address::repeat_byte(0x77);
        let params = [
            uint("amountIn", U256::from(10)),
            uint("amountOutMin", U256::from(9)),
            addr_param("to", stranger),
        ];
        let subject = Subject::Function {
            name: "swapExactTokensForTokens",
            source: Source::VerifiedDatabase,
            template: EffectTemplate::SwapV2,
            params: Some(&params),
        };
        let mut inp = input(subject, &trust, Operation::Call);
        inp.safe_address = Some(Address::repeat_byte(0x11));
        let effect = analyze(&inp);
        assert_eq!(effect.severity, Severity::Danger);
        assert_eq!(effect.beneficiary, Some(stranger));
    }
}
