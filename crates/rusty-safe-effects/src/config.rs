use alloy::primitives::{address, Address};

/// Canonical Safe batch helpers that are expected to run via DELEGATECALL.
pub const DEFAULT_DELEGATECALL_ALLOWLIST: [Address; 4] = [
    // MultiSendCallOnly v1.3.0
    address!("40A2aCCbd92BCA938b02010E17A5b8929b49130D"),
    // MultiSend v1.3.0
    address!("A238CBeb142c10Ef7Ad8442C6D1f9E89e07e7761"),
    // MultiSendCallOnly v1.4.1
    address!("9641d764fc13c8B624c04430C7356C1C7C8102e2"),
    // MultiSend v1.4.1
    address!("38869bf66a61cF6bDB996A6aE40D5853Fd43B526"),
];

#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Upper bound on the untrusted name lookup.
    pub name_lookup_timeout_ms: u64,
    /// Targets a DELEGATECALL may reach without being forced to CRITICAL.
    pub delegatecall_allowlist: Vec<Address>,
    pub max_batch_calls: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            name_lookup_timeout_ms: 3_000,
            delegatecall_allowlist: DEFAULT_DELEGATECALL_ALLOWLIST.to_vec(),
            max_batch_calls: 512,
        }
    }
}

impl DecoderConfig {
    pub fn delegatecall_allowed(&self, target: Option<Address>) -> bool {
        target.is_some_and(|t| self.delegatecall_allowlist.contains(&t))
    }
}
