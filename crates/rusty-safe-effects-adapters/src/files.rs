//! Size-capped file reads shared by the file-backed lookups.

use std::io::ErrorKind;
use std::path::Path;

use alloy::json_abi::JsonAbi;
use eyre::{Result, WrapErr};
use rusty_safe_effects::LookupError;
use serde_json::Value;

use crate::error::AdapterError;

/// Read `path` as UTF-8. `Ok(None)` when the file does not exist.
pub(crate) async fn read_capped(path: &Path, max: u64) -> Result<Option<String>, AdapterError> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(AdapterError::Io {
                path: path.to_owned(),
                source,
            })
        }
    };
    if meta.len() > max {
        return Err(AdapterError::TooLarge {
            path: path.to_owned(),
            size: meta.len(),
            max,
        });
    }
    tokio::fs::read_to_string(path)
        .await
        .map(Some)
        .map_err(|source| AdapterError::Io {
            path: path.to_owned(),
            source,
        })
}

/// Accepts a bare ABI array or an artifact object with an `abi` field.
pub(crate) fn parse_abi(json: &str) -> Result<JsonAbi> {
    let value: Value = serde_json::from_str(json).wrap_err("ABI file is not valid JSON")?;
    let abi = match value {
        Value::Array(_) => value,
        Value::Object(mut obj) => obj
            .remove("abi")
            .ok_or_else(|| eyre::eyre!("ABI object has no 'abi' field"))?,
        _ => eyre::bail!("ABI must be an array or an object with an 'abi' field"),
    };
    serde_json::from_value(abi).wrap_err("ABI entries do not match the JSON ABI schema")
}

/// Read and parse an ABI file, mapped onto the lookup error vocabulary.
pub(crate) async fn load_abi(path: &Path, max: u64) -> Result<Option<JsonAbi>, LookupError> {
    let contents = match read_capped(path, max).await {
        Ok(Some(contents)) => contents,
        Ok(None) => return Ok(None),
        Err(e @ AdapterError::TooLarge { .. }) => return Err(LookupError::Invalid(e.to_string())),
        Err(e) => return Err(LookupError::Unavailable(e.to_string())),
    };
    parse_abi(&contents)
        .map(Some)
        .map_err(|e| LookupError::Invalid(format!("{}: {e:#}", path.display())))
}
