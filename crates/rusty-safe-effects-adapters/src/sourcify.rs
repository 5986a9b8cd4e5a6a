//! Sourcify 4byte signature lookup with caching
//!
//! Uses Sourcify's Signature Database API:
//! https://docs.sourcify.dev/docs/api/#/Signature%20Database/get_signature_database_v1_lookup
//!
//! Results are untrusted hints. They name a function; they never vouch for it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::Selector;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use rusty_safe_effects::{LookupError, NameHint, NameLookup};
use serde::{Deserialize, Serialize};

use crate::config::AdapterConfig;
use crate::error::AdapterError;

/// Response from Sourcify Signature Database API
#[derive(Debug, Deserialize)]
struct SourcifyResponse {
    ok: bool,
    result: SourcifyResult,
}

#[derive(Debug, Deserialize)]
struct SourcifyResult {
    #[serde(default)]
    function: HashMap<String, Vec<SignatureEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureEntry {
    name: String,
    has_verified_contract: Option<bool>,
}

/// A signature with its verification status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    /// Some verified contract on Sourcify uses this signature.
    pub verified: bool,
}

/// Cached 4byte client with spurious connection detection
///
/// Marks the API as unavailable after `max_failed_requests` consecutive
/// connectivity failures (timeout, transport error, 5xx).
#[derive(Clone)]
pub struct SignatureLookup {
    client: reqwest::Client,
    base_url: String,
    max_failed_requests: usize,
    max_cached_selectors: usize,
    cache: Arc<Mutex<HashMap<Selector, Vec<SignatureInfo>>>>,
    is_spurious: Arc<AtomicBool>,
    failed_count: Arc<AtomicUsize>,
}

impl SignatureLookup {
    pub fn new(config: &AdapterConfig) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.sourcify_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.sourcify_base_url.trim_end_matches('/').to_owned(),
            max_failed_requests: config.max_failed_requests,
            max_cached_selectors: config.max_cached_selectors,
            cache: Arc::new(Mutex::new(HashMap::new())),
            is_spurious: Arc::new(AtomicBool::new(false)),
            failed_count: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Check if the API appears to be down
    pub fn is_spurious(&self) -> bool {
        self.is_spurious.load(Ordering::Relaxed)
    }

    /// Reset spurious state (e.g., for retry)
    pub fn reset_spurious(&self) {
        self.is_spurious.store(false, Ordering::Relaxed);
        self.failed_count.store(0, Ordering::Relaxed);
    }

    pub fn is_cached(&self, selector: &Selector) -> bool {
        self.cache().contains_key(selector)
    }

    pub fn cached_len(&self) -> usize {
        self.cache().len()
    }

    /// Signatures for `selector`, verified ones first. Checks the cache first.
    pub async fn signatures(&self, selector: Selector) -> Result<Vec<SignatureInfo>> {
        let cached = self.cache().get(&selector).cloned();
        if let Some(sigs) = cached {
            tracing::trace!(%selector, "4byte cache hit");
            return Ok(sigs);
        }
        if self.is_spurious() {
            eyre::bail!(
                "Sourcify marked unavailable after {} failed requests",
                self.max_failed_requests
            );
        }

        let sigs = self
            .fetch(selector)
            .await
            .inspect_err(|e| tracing::warn!(%selector, error = %e, "4byte lookup failed"))?;
        tracing::debug!(%selector, count = sigs.len(), "fetched signatures");

        let mut cache = self.cache();
        if cache.len() < self.max_cached_selectors {
            cache.insert(selector, sigs.clone());
        }
        Ok(sigs)
    }

    async fn fetch(&self, selector: Selector) -> Result<Vec<SignatureInfo>> {
        let url = format!("{}?function={}&filter=true", self.base_url, selector);

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    self.on_failure();
                }
                return Err(e).wrap_err("Failed to fetch from Sourcify API");
            }
        };

        let status = response.status();
        if !status.is_success() {
            if status.is_server_error() {
                self.on_failure();
            }
            eyre::bail!("Sourcify API error: {status}");
        }

        let api_response: SourcifyResponse = response
            .json()
            .await
            .wrap_err("Failed to parse Sourcify response")?;
        if !api_response.ok {
            eyre::bail!("Sourcify API returned ok=false");
        }
        self.on_success();

        let key = selector.to_string();
        let entries = api_response
            .result
            .function
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
            .map(|(_, v)| v)
            .unwrap_or_default();

        let mut sigs: Vec<SignatureInfo> = entries
            .into_iter()
            .map(|e| SignatureInfo {
                signature: e.name,
                verified: e.has_verified_contract.unwrap_or(false),
            })
            .collect();
        // stable: keeps API order within each group
        sigs.sort_by(|a, b| b.verified.cmp(&a.verified));
        Ok(sigs)
    }

    fn on_success(&self) {
        self.failed_count.store(0, Ordering::Relaxed);
    }

    fn on_failure(&self) {
        let count = self.failed_count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::warn!(count, max = self.max_failed_requests, "Sourcify request failed");
        if count >= self.max_failed_requests {
            tracing::warn!("marking Sourcify as unavailable");
            self.is_spurious.store(true, Ordering::Relaxed);
        }
    }

    /// Acquire the cache, recovering from a poisoned lock.
    fn cache(&self) -> MutexGuard<'_, HashMap<Selector, Vec<SignatureInfo>>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("signature cache mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[async_trait]
impl NameLookup for SignatureLookup {
    async fn lookup(&self, selector: Selector) -> Result<Option<NameHint>, LookupError> {
        let sigs = self
            .signatures(selector)
            .await
            .map_err(|e| LookupError::Unavailable(format!("{e:#}")))?;
        Ok(sigs
            .iter()
            .find_map(|s| NameHint::from_signature(&s.signature)))
    }
}
