use thiserror::Error;

use crate::types::LookupKind;

/// Failure of a whole decode request.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid calldata: {0}")]
    InvalidCalldata(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("lookup unavailable ({lookup}): {reason}")]
    LookupUnavailable { lookup: LookupKind, reason: String },
    #[error("sub-call analysis aborted: {0}")]
    Aborted(String),
}

impl DecodeError {
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::InvalidCalldata(_) => "INVALID_CALLDATA",
            DecodeError::Validation(_) => "VALIDATION_ERROR",
            DecodeError::LookupUnavailable { .. } => "LOOKUP_UNAVAILABLE",
            DecodeError::Aborted(_) => "ABORTED",
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DecodeError::InvalidCalldata(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        DecodeError::Validation(msg.into())
    }
}

/// Returned by every lookup port. Recovered as "source absent" unless the
/// caller required that lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("invalid response: {0}")]
    Invalid(String),
}

/// Parameter decoding failed for an otherwise selected ABI fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamDecodeError {
    #[error("selector mismatch: calldata has {found}, fragment expects {expected}")]
    SelectorMismatch { expected: String, found: String },
    #[error("abi decode failed for '{signature}': {reason}")]
    Abi { signature: String, reason: String },
}
