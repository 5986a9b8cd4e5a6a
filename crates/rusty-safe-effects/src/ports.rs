use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, Selector};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// A registry record for one deployed contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiEntry {
    pub chain_id: u64,
    pub contract_address: Address,
    pub abi: JsonAbi,
    pub function_count: usize,
}

impl AbiEntry {
    pub fn new(chain_id: u64, contract_address: Address, abi: JsonAbi) -> Self {
        let function_count = abi.functions().count();
        Self {
            chain_id,
            contract_address,
            abi,
            function_count,
        }
    }

    pub fn function(&self, selector: &Selector) -> Option<&Function> {
        find_function(&self.abi, selector)
    }
}

pub fn find_function<'a>(abi: &'a JsonAbi, selector: &Selector) -> Option<&'a Function> {
    abi.functions().find(|f| f.selector() == *selector)
}

/// Untrusted name hint from a public signature database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameHint {
    pub name: String,
    pub args: Vec<String>,
}

impl NameHint {
    /// Split `name(type,type)` into a hint. Returns `None` for anything else.
    pub fn from_signature(signature: &str) -> Option<Self> {
        let (name, rest) = signature.trim().split_once('(')?;
        let args = rest.strip_suffix(')')?;
        if name.is_empty() {
            return None;
        }
        let args = split_top_level(args);
        Some(Self {
            name: name.to_owned(),
            args,
        })
    }

    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.args.join(","))
    }
}

fn split_top_level(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in args.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => out.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Read-only local ABI registry, keyed by chain and address.
#[async_trait]
pub trait AbiRegistry: Send + Sync {
    async fn lookup(&self, chain_id: u64, address: Address) -> Result<Option<AbiEntry>, LookupError>;
}

/// Resolves the `abiPath` a trust profile attaches to a contract.
#[async_trait]
pub trait ProfileAbiSource: Send + Sync {
    async fn load(&self, abi_path: &str) -> Result<Option<JsonAbi>, LookupError>;
}

/// Untrusted selector-name service. Results never influence severity.
#[async_trait]
pub trait NameLookup: Send + Sync {
    async fn lookup(&self, selector: Selector) -> Result<Option<NameHint>, LookupError>;
}

/// Registry with no entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAbiRegistry;

#[async_trait]
impl AbiRegistry for NoAbiRegistry {
    async fn lookup(&self, _chain_id: u64, _address: Address) -> Result<Option<AbiEntry>, LookupError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProfileAbis;

#[async_trait]
impl ProfileAbiSource for NoProfileAbis {
    async fn load(&self, _abi_path: &str) -> Result<Option<JsonAbi>, LookupError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoNameLookup;

#[async_trait]
impl NameLookup for NoNameLookup {
    async fn lookup(&self, _selector: Selector) -> Result<Option<NameHint>, LookupError> {
        Ok(None)
    }
}
