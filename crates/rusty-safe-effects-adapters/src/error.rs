use std::path::PathBuf;

use rusty_safe_effects::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is {size} bytes, limit is {max}")]
    TooLarge { path: PathBuf, size: u64, max: u64 },
    #[error(transparent)]
    Profile(#[from] DecodeError),
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}
