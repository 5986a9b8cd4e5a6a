//! File-backed local ABI registry

use std::path::{Path, PathBuf};

use alloy::primitives::{hex, Address};
use async_trait::async_trait;
use rusty_safe_effects::{AbiEntry, AbiRegistry, LookupError};

use crate::config::AdapterConfig;
use crate::files::load_abi;

/// Reads `{root}/{chainId}/{0xlowercaseaddress}.json`.
#[derive(Debug, Clone)]
pub struct FileAbiRegistry {
    root: PathBuf,
    max_bytes: u64,
}

impl FileAbiRegistry {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(&config.abi_registry_dir, config.abi_max_bytes)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, chain_id: u64, address: Address) -> PathBuf {
        self.root
            .join(chain_id.to_string())
            .join(format!("0x{}.json", hex::encode(address)))
    }
}

#[async_trait]
impl AbiRegistry for FileAbiRegistry {
    async fn lookup(&self, chain_id: u64, address: Address) -> Result<Option<AbiEntry>, LookupError> {
        let path = self.entry_path(chain_id, address);
        let abi = load_abi(&path, self.max_bytes).await?;
        match &abi {
            Some(abi) => tracing::debug!(
                chain_id,
                %address,
                functions = abi.functions().count(),
                "registry hit"
            ),
            None => tracing::trace!(chain_id, %address, "registry miss"),
        }
        Ok(abi.map(|abi| AbiEntry::new(chain_id, address, abi)))
    }
}
