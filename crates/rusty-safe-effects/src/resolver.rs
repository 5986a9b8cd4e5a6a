//! Function identification
//!
//! Five sources are tried in a fixed order and the first hit wins. Only the
//! first three carry an ABI fragment and can decode parameters; when that
//! decoding fails for a registry or profile ABI, the source is skipped and the
//! next one is tried.

use std::time::Duration;

use alloy::json_abi::Function;
use alloy::primitives::{Address, Selector};

use crate::catalog::SelectorCatalog;
use crate::error::{DecodeError, LookupError};
use crate::params::decode_params;
use crate::ports::{find_function, AbiRegistry, NameLookup, ProfileAbiSource};
use crate::profile::TrustProfile;
use crate::types::{DecodedParam, EffectTemplate, LookupKind, Source};

/// The winning source's view of the called function.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub source: Source,
    pub function_name: Option<String>,
    pub signature: Option<String>,
    /// Set for catalog hits only.
    pub template: Option<EffectTemplate>,
    pub params: Option<Vec<DecodedParam>>,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub selector: Selector,
    /// Full calldata, selector included.
    pub calldata: &'a [u8],
    pub target: Option<Address>,
    pub chain_id: u64,
    pub profile: Option<&'a TrustProfile>,
    pub offline: bool,
    pub required_lookup: Option<LookupKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Catalog,
    Registry,
    ProfileAbi,
    ProfileLabel,
    NameLookup,
}

const CHAIN: [Step; 5] = [
    Step::Catalog,
    Step::Registry,
    Step::ProfileAbi,
    Step::ProfileLabel,
    Step::NameLookup,
];

pub struct SelectorResolver<'a> {
    pub catalog: &'a SelectorCatalog,
    pub registry: &'a dyn AbiRegistry,
    pub profile_abis: &'a dyn ProfileAbiSource,
    pub names: &'a dyn NameLookup,
    pub name_timeout: Duration,
}

impl SelectorResolver<'_> {
    /// `Ok(None)` means no source knows the selector; that is not an error.
    pub async fn resolve(
        &self,
        req: &ResolveRequest<'_>,
    ) -> Result<Option<Identification>, DecodeError> {
        for step in CHAIN {
            if let Some(id) = self.try_step(step, req).await? {
                tracing::debug!(selector = %req.selector, source = ?id.source, "selector resolved");
                return Ok(Some(id));
            }
        }
        tracing::debug!(selector = %req.selector, "selector unresolved");
        Ok(None)
    }

    async fn try_step(
        &self,
        step: Step,
        req: &ResolveRequest<'_>,
    ) -> Result<Option<Identification>, DecodeError> {
        match step {
            Step::Catalog => Ok(self.from_catalog(req)),
            Step::Registry => self.from_registry(req).await,
            Step::ProfileAbi => self.from_profile_abi(req).await,
            Step::ProfileLabel => Ok(from_profile_label(req)),
            Step::NameLookup => self.from_name_lookup(req).await,
        }
    }

    fn from_catalog(&self, req: &ResolveRequest<'_>) -> Option<Identification> {
        let entry = self.catalog.get(&req.selector)?;
        // A catalog hit is never shadowed, even when its parameters are malformed.
        let params = match decode_params(&entry.function, req.calldata) {
            Ok(params) => Some(params),
            Err(e) => {
                tracing::warn!(selector = %req.selector, error = %e, "catalog parameters did not decode");
                None
            }
        };
        Some(Identification {
            source: Source::VerifiedDatabase,
            function_name: Some(entry.function_name.clone()),
            signature: Some(entry.signature.to_owned()),
            template: Some(entry.effect_template),
            params,
        })
    }

    async fn from_registry(
        &self,
        req: &ResolveRequest<'_>,
    ) -> Result<Option<Identification>, DecodeError> {
        let Some(target) = req.target else {
            return Ok(None);
        };
        let entry = recover(
            LookupKind::LocalRegistry,
            req,
            self.registry.lookup(req.chain_id, target).await,
        )?;
        Ok(entry
            .as_ref()
            .and_then(|e| e.function(&req.selector))
            .and_then(|f| with_abi(Source::LocalRegistry, f, req)))
    }

    async fn from_profile_abi(
        &self,
        req: &ResolveRequest<'_>,
    ) -> Result<Option<Identification>, DecodeError> {
        let Some(abi_path) = req
            .target
            .zip(req.profile)
            .and_then(|(t, p)| p.contract(&t))
            .and_then(|c| c.abi_path.as_deref())
        else {
            return Ok(None);
        };
        let abi = recover(
            LookupKind::TrustProfileAbi,
            req,
            self.profile_abis.load(abi_path).await,
        )?;
        Ok(abi
            .as_ref()
            .and_then(|abi| find_function(abi, &req.selector))
            .and_then(|f| with_abi(Source::TrustProfileAbi, f, req)))
    }

    async fn from_name_lookup(
        &self,
        req: &ResolveRequest<'_>,
    ) -> Result<Option<Identification>, DecodeError> {
        if req.offline {
            return Ok(None);
        }
        let timeout_ms = u64::try_from(self.name_timeout.as_millis()).unwrap_or(u64::MAX);
        let result = match tokio::time::timeout(self.name_timeout, self.names.lookup(req.selector)).await
        {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(timeout_ms)),
        };
        let hint = recover(LookupKind::Fourbyte, req, result)?;
        Ok(hint.map(|hint| Identification {
            source: Source::Fourbyte,
            function_name: Some(hint.name.clone()),
            signature: Some(hint.signature()),
            template: None,
            params: None,
        }))
    }
}

fn from_profile_label(req: &ResolveRequest<'_>) -> Option<Identification> {
    let label = req
        .target
        .zip(req.profile)
        .and_then(|(t, p)| p.contract(&t))
        .and_then(|c| c.allowed_selectors_labels.get(&req.selector))?;
    Some(Identification {
        source: Source::TrustProfile,
        function_name: Some(label.clone()),
        signature: None,
        template: None,
        params: None,
    })
}

/// Decode with an ABI-backed source, or skip the source if decoding fails.
fn with_abi(source: Source, function: &Function, req: &ResolveRequest<'_>) -> Option<Identification> {
    match decode_params(function, req.calldata) {
        Ok(params) => Some(Identification {
            source,
            function_name: Some(function.name.clone()),
            signature: Some(function.signature()),
            template: None,
            params: Some(params),
        }),
        Err(e) => {
            tracing::warn!(
                selector = %req.selector,
                source = ?source,
                error = %e,
                "parameters did not decode, falling back to next source"
            );
            None
        }
    }
}

/// A failed lookup is an absent source unless the caller required it.
fn recover<T>(
    kind: LookupKind,
    req: &ResolveRequest<'_>,
    result: Result<Option<T>, LookupError>,
) -> Result<Option<T>, DecodeError> {
    match result {
        Ok(found) => Ok(found),
        Err(e) if req.required_lookup == Some(kind) => Err(DecodeError::LookupUnavailable {
            lookup: kind,
            reason: e.to_string(),
        }),
        Err(e) => {
            tracing::warn!(lookup = %kind, selector = %req.selector, error = %e, "lookup failed, treating source as absent");
            Ok(None)
        }
    }
}
