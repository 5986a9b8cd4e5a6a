//! Verified selector catalog
//!
//! Static, process-wide mapping of selectors to well-known functions and the
//! consequence template each one is analysed with. Selectors are derived from
//! the signatures below the first time the catalog is touched.

use std::collections::HashMap;
use std::sync::LazyLock;

use alloy::json_abi::Function;
use alloy::primitives::Selector;
use serde::Serialize;

use crate::types::{EffectCategory, EffectTemplate};

/// MultiSend `multiSend(bytes)` selector.
pub const MULTISEND_SELECTOR: Selector = Selector::new([0x8d, 0x80, 0xff, 0x0a]);

/// (signature, parameter names, template)
type Definition = (&'static str, &'static [&'static str], EffectTemplate);

const DEFINITIONS: &[Definition] = &[
    // ERC-20 allowances
    ("approve(address,uint256)", &["spender", "amount"], EffectTemplate::Approve),
    ("increaseAllowance(address,uint256)", &["spender", "addedValue"], EffectTemplate::IncreaseAllowance),
    ("decreaseAllowance(address,uint256)", &["spender", "subtractedValue"], EffectTemplate::DecreaseAllowance),
    (
        "permit(address,address,uint256,uint256,uint8,bytes32,bytes32)",
        &["owner", "spender", "value", "deadline", "v", "r", "s"],
        EffectTemplate::Permit,
    ),
    // ERC-721 / ERC-1155 operators
    ("setApprovalForAll(address,bool)", &["operator", "approved"], EffectTemplate::SetApprovalForAll),
    // Transfers
    ("transfer(address,uint256)", &["to", "amount"], EffectTemplate::Transfer),
    ("transferFrom(address,address,uint256)", &["from", "to", "amount"], EffectTemplate::TransferFrom),
    ("safeTransferFrom(address,address,uint256)", &["from", "to", "tokenId"], EffectTemplate::NftTransfer),
    // DEX
    (
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        &["amountIn", "amountOutMin", "path", "to", "deadline"],
        EffectTemplate::SwapV2,
    ),
    (
        "swapExactETHForTokens(uint256,address[],address,uint256)",
        &["amountOutMin", "path", "to", "deadline"],
        EffectTemplate::SwapV2,
    ),
    (
        "swapExactTokensForETH(uint256,uint256,address[],address,uint256)",
        &["amountIn", "amountOutMin", "path", "to", "deadline"],
        EffectTemplate::SwapV2,
    ),
    (
        "exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))",
        &["params"],
        EffectTemplate::SwapV3Single,
    ),
    // Ownership
    ("transferOwnership(address)", &["newOwner"], EffectTemplate::TransferOwnership),
    ("renounceOwnership()", &[], EffectTemplate::RenounceOwnership),
    // Proxies
    ("upgradeTo(address)", &["newImplementation"], EffectTemplate::UpgradeTo),
    ("upgradeToAndCall(address,bytes)", &["newImplementation", "data"], EffectTemplate::UpgradeToAndCall),
    ("changeAdmin(address)", &["newAdmin"], EffectTemplate::ChangeProxyAdmin),
    // Safe administration
    ("addOwnerWithThreshold(address,uint256)", &["owner", "_threshold"], EffectTemplate::AddOwner),
    ("removeOwner(address,address,uint256)", &["prevOwner", "owner", "_threshold"], EffectTemplate::RemoveOwner),
    ("swapOwner(address,address,address)", &["prevOwner", "oldOwner", "newOwner"], EffectTemplate::SwapOwner),
    ("changeThreshold(uint256)", &["_threshold"], EffectTemplate::ChangeThreshold),
    ("enableModule(address)", &["module"], EffectTemplate::EnableModule),
    ("disableModule(address,address)", &["prevModule", "module"], EffectTemplate::DisableModule),
    ("setGuard(address)", &["guard"], EffectTemplate::SetGuard),
    ("setFallbackHandler(address)", &["handler"], EffectTemplate::SetFallbackHandler),
    // Batches
    ("multiSend(bytes)", &["transactions"], EffectTemplate::MultiSend),
];

/// A verified catalog record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorEntry {
    pub selector: Selector,
    pub signature: &'static str,
    pub function_name: String,
    pub category: EffectCategory,
    #[serde(rename = "effectTemplateId")]
    pub effect_template: EffectTemplate,
    /// Parsed fragment with named inputs, used for parameter decoding.
    #[serde(skip)]
    pub function: Function,
}

#[derive(Debug)]
pub struct SelectorCatalog {
    entries: Vec<SelectorEntry>,
    index: HashMap<Selector, usize>,
}

static CATALOG: LazyLock<SelectorCatalog> = LazyLock::new(SelectorCatalog::build);

impl SelectorCatalog {
    /// The process-wide catalog.
    pub fn global() -> &'static SelectorCatalog {
        &CATALOG
    }

    fn build() -> Self {
        let mut entries = Vec::with_capacity(DEFINITIONS.len());
        let mut index = HashMap::with_capacity(DEFINITIONS.len());

        for (signature, names, template) in DEFINITIONS {
            let mut function = match Function::parse(signature) {
                Ok(f) => f,
                Err(e) => {
                    tracing::error!(signature, error = %e, "catalog signature does not parse");
                    continue;
                }
            };
            for (input, name) in function.inputs.iter_mut().zip(names.iter()) {
                input.name = (*name).to_string();
            }
            let selector = function.selector();
            if index.contains_key(&selector) {
                tracing::error!(signature, %selector, "duplicate catalog selector");
                continue;
            }
            index.insert(selector, entries.len());
            entries.push(SelectorEntry {
                selector,
                signature,
                function_name: function.name.clone(),
                category: template.category(),
                effect_template: *template,
                function,
            });
        }

        tracing::debug!(entries = entries.len(), "selector catalog ready");
        Self { entries, index }
    }

    pub fn get(&self, selector: &Selector) -> Option<&SelectorEntry> {
        self.index.get(selector).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        self.index.contains_key(selector)
    }

    pub fn entries(&self) -> &[SelectorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    #[test]
    fn test_every_definition_builds() {
        assert_eq!(SelectorCatalog::global().len(), DEFINITIONS.len());
    }

    #[test]
    fn test_selectors_match_keccak() {
        for entry in SelectorCatalog::global().entries() {
            let hash = keccak256(entry.function.signature().as_bytes());
            assert_eq!(&hash[..4], entry.selector.as_slice(), "{}", entry.signature);
        }
    }

    #[test]
    fn test_well_known_selectors() {
        let catalog = SelectorCatalog::global();
        let approve = catalog
            .get(&"0x095ea7b3".parse().unwrap())
            .expect("approve in catalog");
        assert_eq!(approve.function_name, "approve");
        assert_eq!(approve.category, EffectCategory::Approval);
        assert_eq!(approve.function.inputs[1].name, "amount");

        let multisend = catalog.get(&MULTISEND_SELECTOR).expect("multiSend in catalog");
        assert_eq!(multisend.effect_template, EffectTemplate::MultiSend);
        assert!(catalog.contains(&"0xa9059cbb".parse().unwrap()));
    }

    #[test]
    fn test_aave_supply_is_not_catalogued() {
        assert!(!SelectorCatalog::global().contains(&"0x617ba037".parse().unwrap()));
    }
}
