use std::path::Path;

use rusty_safe_effects::TrustProfile;

use crate::error::AdapterError;
use crate::files::read_capped;

/// Load and validate a trust profile document.
pub async fn load_trust_profile(path: &Path, max_bytes: u64) -> Result<TrustProfile, AdapterError> {
    let json = read_capped(path, max_bytes)
        .await?
        .ok_or_else(|| AdapterError::Io {
            path: path.to_owned(),
            source: std::io::ErrorKind::NotFound.into(),
        })?;
    let profile = TrustProfile::from_json(&json)?;
    tracing::info!(
        path = %path.display(),
        safe = %profile.safe_address,
        contracts = profile.trusted_contracts.len(),
        "trust profile loaded"
    );
    Ok(profile)
}
