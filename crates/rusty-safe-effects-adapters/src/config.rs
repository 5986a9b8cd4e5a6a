use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub sourcify_base_url: String,
    pub sourcify_timeout_ms: u64,
    /// Consecutive connectivity failures before Sourcify is treated as down.
    pub max_failed_requests: usize,
    pub max_cached_selectors: usize,
    /// Root of the local ABI registry: `{dir}/{chainId}/{address}.json`.
    pub abi_registry_dir: PathBuf,
    /// Base directory `abiPath` references in a trust profile resolve against.
    pub profile_abi_dir: PathBuf,
    pub abi_max_bytes: u64,
    pub profile_max_bytes: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            sourcify_base_url: "https://api.4byte.sourcify.dev/signature-database/v1/lookup"
                .to_owned(),
            sourcify_timeout_ms: 3_000,
            max_failed_requests: 3,
            max_cached_selectors: 1_000,
            abi_registry_dir: PathBuf::from("abis"),
            profile_abi_dir: PathBuf::from("."),
            abi_max_bytes: 512 * 1024,
            profile_max_bytes: 1024 * 1024,
        }
    }
}
