//! Trust classification
//!
//! Places a `(target, selector)` pair against a trust profile. Pure function
//! of its inputs; the profile is never written.

use alloy::primitives::{Address, Selector};

use crate::profile::{AllowedSelectors, TrustLevel, TrustProfile};
use crate::types::{ContractClassification, SelectorClassification, TrustContext};

/// Uses at or below this count mark a selector as unusual.
pub const UNUSUAL_MAX_USES: u64 = 2;

/// Classify a call. `selector` is `None` for plain value transfers.
pub fn classify(
    target: Option<Address>,
    selector: Option<Selector>,
    profile: Option<&TrustProfile>,
) -> TrustContext {
    let Some(profile) = profile else {
        return TrustContext::unloaded();
    };

    let mut ctx = TrustContext {
        profile_loaded: true,
        ..TrustContext::unloaded()
    };

    let Some((address, contract)) =
        target.and_then(|t| profile.contract(&t).map(|c| (t, c)))
    else {
        ctx.contract_classification = ContractClassification::Unknown;
        ctx.trust_blocked = true;
        ctx.warnings.push(match target {
            Some(t) => format!(
                "Target {t} is not in the trust profile for Safe {}",
                profile.safe_address
            ),
            None => "No target address was supplied; the contract cannot be matched against the trust profile".to_owned(),
        });
        return ctx;
    };

    ctx.trust_level = Some(contract.trust_level);
    ctx.label = Some(contract.label.clone());
    ctx.notes = contract.notes.clone();
    ctx.selector_label = selector.and_then(|s| contract.allowed_selectors_labels.get(&s).cloned());

    if contract.trust_level == TrustLevel::Watched {
        ctx.contract_classification = ContractClassification::Watched;
        ctx.warnings.push(format!(
            "{} is on the watch list; the trust profile does not vouch for its calls",
            display_name(&contract.label, address)
        ));
        return ctx;
    }
    ctx.contract_classification = ContractClassification::Trusted;

    let Some(selector) = selector else {
        return ctx;
    };
    let name = display_name(&contract.label, address);

    let classification = match &contract.allowed_selectors {
        AllowedSelectors::All => SelectorClassification::Expected,
        allowed if !allowed.allows(&selector) => {
            ctx.warnings.push(format!(
                "Selector {selector} is not allowed for {name}"
            ));
            SelectorClassification::NotAllowed
        }
        _ => match profile.usage_count(&address, &selector) {
            0 => {
                ctx.warnings.push(format!(
                    "Selector {selector} has never been used with {name}"
                ));
                SelectorClassification::NeverUsed
            }
            n if n <= UNUSUAL_MAX_USES => {
                ctx.warnings.push(format!(
                    "Selector {selector} has only been used {n} time(s) with {name}"
                ));
                SelectorClassification::Unusual
            }
            _ => SelectorClassification::Expected,
        },
    };
    ctx.selector_classification = Some(classification);
    ctx
}

fn display_name(label: &str, address: Address) -> String {
    if label.is_empty() {
        address.to_string()
    } else {
        format!("{label} ({address})")
    }
}
