use std::path::{Component, Path, PathBuf};

use alloy::json_abi::JsonAbi;
use async_trait::async_trait;
use rusty_safe_effects::{LookupError, ProfileAbiSource};

use crate::config::AdapterConfig;
use crate::files::load_abi;

/// Resolves a profile's `abiPath` below a base directory.
#[derive(Debug, Clone)]
pub struct FileProfileAbiSource {
    base_dir: PathBuf,
    max_bytes: u64,
}

impl FileProfileAbiSource {
    pub fn new(base_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_bytes,
        }
    }

    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(&config.profile_abi_dir, config.abi_max_bytes)
    }

    /// Relative paths only; no `..` segments.
    fn resolve(&self, abi_path: &str) -> Result<PathBuf, LookupError> {
        let relative = Path::new(abi_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if abi_path.is_empty() || escapes {
            return Err(LookupError::Invalid(format!(
                "abiPath '{abi_path}' must be a relative path inside the ABI directory"
            )));
        }
        Ok(self.base_dir.join(relative))
    }
}

#[async_trait]
impl ProfileAbiSource for FileProfileAbiSource {
    async fn load(&self, abi_path: &str) -> Result<Option<JsonAbi>, LookupError> {
        let path = self.resolve(abi_path)?;
        load_abi(&path, self.max_bytes).await
    }
}
