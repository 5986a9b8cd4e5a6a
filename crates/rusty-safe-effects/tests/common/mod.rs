#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{address, hex, Address, Selector, U256};
use async_trait::async_trait;

use rusty_safe_effects::batch::{encode_transactions, BatchRecord};
use rusty_safe_effects::{
    AbiEntry, AbiRegistry, DecodeOptions, Decoder, DecoderConfig, LookupError, NameHint,
    NameLookup, Operation, ProfileAbiSource, TrustProfile,
};

pub const SAFE: Address = address!("1000000000000000000000000000000000000001");
pub const AAVE_POOL: Address = address!("87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2");
pub const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const PERMIT2: Address = address!("000000000022D473030F116dDEE9F6B43aC78BA3");
pub const MULTISEND_CALL_ONLY: Address = address!("40A2aCCbd92BCA938b02010E17A5b8929b49130D");
pub const VAULT: Address = address!("3000000000000000000000000000000000000003");
pub const STRANGER: Address = address!("9999999999999999999999999999999999999999");

pub const SUPPLY_SIG: &str = "supply(address,uint256,address,uint16)";

pub fn profile_json() -> String {
    serde_json::json!({
        "safeAddress": SAFE,
        "version": 2,
        "trustedContracts": {
            AAVE_POOL.to_string(): {
                "label": "Aave V3 Pool",
                "trustLevel": "PROTOCOL",
                "allowedSelectors": ["0x617ba037", "0x69328dec", "0xa415bcad"],
                "allowedSelectorsLabels": {
                    "0x617ba037": "Supply",
                    "0x69328dec": "Withdraw"
                },
                "notes": "Main lending market"
            },
            USDC.to_string(): {
                "label": "USDC",
                "trustLevel": "PARTNER",
                "allowedSelectors": ["0x095ea7b3", "0xa9059cbb"]
            },
            MULTISEND_CALL_ONLY.to_string(): {
                "label": "MultiSendCallOnly",
                "trustLevel": "INTERNAL",
                "allowedSelectors": "*"
            },
            VAULT.to_string(): {
                "label": "Treasury vault",
                "trustLevel": "INTERNAL",
                "allowedSelectors": "*",
                "abiPath": "abis/vault.json"
            }
        },
        "selectorUsageHistory": {
            AAVE_POOL.to_string(): {
                "0x617ba037": { "count": 47, "lastUsed": "2026-09-30T12:00:00Z" },
                "0x69328dec": { "count": 2 },
                "0xa415bcad": { "count": 3 }
            },
            USDC.to_string(): {
                "0x095ea7b3": { "count": 10 }
            }
        }
    })
    .to_string()
}

pub fn profile() -> Arc<TrustProfile> {
    Arc::new(TrustProfile::from_json(&profile_json()).expect("fixture profile"))
}

pub fn options() -> DecodeOptions {
    DecodeOptions::offline()
}

pub fn options_with_profile(target: Address) -> DecodeOptions {
    DecodeOptions {
        profile: Some(profile()),
        ..DecodeOptions::offline().with_target(target)
    }
}

// --- Calldata builders ---

pub fn encode_call(signature: &str, args: &[DynSolValue]) -> Vec<u8> {
    Function::parse(signature)
        .expect("signature")
        .abi_encode_input(args)
        .expect("encode")
}

pub fn hex_call(signature: &str, args: &[DynSolValue]) -> String {
    format!("0x{}", hex::encode(encode_call(signature, args)))
}

pub fn addr(a: Address) -> DynSolValue {
    DynSolValue::Address(a)
}

pub fn uint(v: U256) -> DynSolValue {
    DynSolValue::Uint(v, 256)
}

pub fn approve_max(spender: Address) -> String {
    hex_call("approve(address,uint256)", &[addr(spender), uint(U256::MAX)])
}

pub fn transfer(to: Address, amount: u64) -> Vec<u8> {
    encode_call("transfer(address,uint256)", &[addr(to), uint(U256::from(amount))])
}

pub fn aave_supply(amount: u64) -> Vec<u8> {
    encode_call(
        SUPPLY_SIG,
        &[
            addr(USDC),
            uint(U256::from(amount)),
            addr(SAFE),
            DynSolValue::Uint(U256::ZERO, 16),
        ],
    )
}

pub fn record(operation: Operation, to: Address, value: u64, data: Vec<u8>) -> BatchRecord {
    BatchRecord {
        operation,
        to,
        value: U256::from(value),
        data,
    }
}

pub fn multisend_bytes(packed: Vec<u8>) -> String {
    hex_call("multiSend(bytes)", &[DynSolValue::Bytes(packed)])
}

pub fn multisend(records: &[BatchRecord]) -> String {
    multisend_bytes(encode_transactions(records))
}

pub fn supply_abi() -> JsonAbi {
    serde_json::from_value(serde_json::json!([{
        "type": "function",
        "name": "supply",
        "stateMutability": "nonpayable",
        "inputs": [
            { "name": "asset", "type": "address" },
            { "name": "amount", "type": "uint256" },
            { "name": "onBehalfOf", "type": "address" },
            { "name": "referralCode", "type": "uint16" }
        ],
        "outputs": []
    }]))
    .expect("abi")
}

pub fn erc20_abi() -> JsonAbi {
    serde_json::from_value(serde_json::json!([{
        "type": "function",
        "name": "approve",
        "stateMutability": "nonpayable",
        "inputs": [
            { "name": "who", "type": "address" },
            { "name": "howMuch", "type": "uint256" }
        ],
        "outputs": [{ "name": "", "type": "bool" }]
    }]))
    .expect("abi")
}

// --- Port stubs ---

#[derive(Default)]
pub struct MemoryRegistry {
    entries: HashMap<(u64, Address), AbiEntry>,
    pub calls: AtomicUsize,
}

impl MemoryRegistry {
    pub fn with(mut self, chain_id: u64, address: Address, abi: JsonAbi) -> Self {
        self.entries
            .insert((chain_id, address), AbiEntry::new(chain_id, address, abi));
        self
    }
}

#[async_trait]
impl AbiRegistry for MemoryRegistry {
    async fn lookup(&self, chain_id: u64, address: Address) -> Result<Option<AbiEntry>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.get(&(chain_id, address)).cloned())
    }
}

pub struct FailingRegistry;

#[async_trait]
impl AbiRegistry for FailingRegistry {
    async fn lookup(&self, _chain_id: u64, _address: Address) -> Result<Option<AbiEntry>, LookupError> {
        Err(LookupError::Unavailable("registry offline".to_owned()))
    }
}

#[derive(Default)]
pub struct MemoryProfileAbis {
    abis: HashMap<String, JsonAbi>,
}

impl MemoryProfileAbis {
    pub fn with(mut self, path: &str, abi: JsonAbi) -> Self {
        self.abis.insert(path.to_owned(), abi);
        self
    }
}

#[async_trait]
impl ProfileAbiSource for MemoryProfileAbis {
    async fn load(&self, abi_path: &str) -> Result<Option<JsonAbi>, LookupError> {
        Ok(self.abis.get(abi_path).cloned())
    }
}

/// Name service returning fixed hints, optionally after a per-selector delay.
#[derive(Default)]
pub struct StubNames {
    hints: HashMap<Selector, (String, Duration)>,
    pub calls: AtomicUsize,
}

impl StubNames {
    pub fn with(mut self, selector: &str, signature: &str) -> Self {
        self.hints.insert(
            selector.parse().expect("selector"),
            (signature.to_owned(), Duration::ZERO),
        );
        self
    }

    pub fn with_delay(mut self, selector: &str, signature: &str, delay: Duration) -> Self {
        self.hints
            .insert(selector.parse().expect("selector"), (signature.to_owned(), delay));
        self
    }
}

#[async_trait]
impl NameLookup for StubNames {
    async fn lookup(&self, selector: Selector) -> Result<Option<NameHint>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((signature, delay)) = self.hints.get(&selector) else {
            return Ok(None);
        };
        if !delay.is_zero() {
            tokio::time::sleep(*delay).await;
        }
        Ok(NameHint::from_signature(signature))
    }
}

pub struct FailingNames;

#[async_trait]
impl NameLookup for FailingNames {
    async fn lookup(&self, _selector: Selector) -> Result<Option<NameHint>, LookupError> {
        Err(LookupError::Unavailable("connection refused".to_owned()))
    }
}

pub fn decoder() -> Decoder {
    Decoder::default()
}

pub fn decoder_with_names(names: StubNames, timeout_ms: u64) -> Decoder {
    Decoder::new(DecoderConfig {
        name_lookup_timeout_ms: timeout_ms,
        ..DecoderConfig::default()
    })
    .with_name_lookup(Arc::new(names))
}
