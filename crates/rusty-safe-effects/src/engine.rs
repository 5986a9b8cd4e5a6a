//! `decode` entry point

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{hex, Address, Selector, U256};
use tokio::task::JoinSet;

use crate::batch::{self, BatchRecord};
use crate::catalog::SelectorCatalog;
use crate::config::DecoderConfig;
use crate::effects::{self, EffectInput, Subject};
use crate::error::DecodeError;
use crate::ports::{AbiRegistry, NameLookup, NoAbiRegistry, NoNameLookup, NoProfileAbis, ProfileAbiSource};
use crate::profile::TrustProfile;
use crate::resolver::{Identification, ResolveRequest, SelectorResolver};
use crate::trust;
use crate::types::{
    BatchInfo, CallAnalysis, DecodeResult, EffectTemplate, LookupKind, Operation, Severity,
    Source, SubCall,
};

/// Per-request options.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub target_address: Option<Address>,
    pub operation: Operation,
    pub profile: Option<Arc<TrustProfile>>,
    /// Suppress the untrusted name lookup.
    pub offline: bool,
    pub chain_id: u64,
    /// Native value sent with the call, in wei.
    pub value: U256,
    /// A lookup whose failure should fail the decode instead of being skipped.
    pub required_lookup: Option<LookupKind>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            target_address: None,
            operation: Operation::Call,
            profile: None,
            offline: false,
            chain_id: 1,
            value: U256::ZERO,
            required_lookup: None,
        }
    }
}

impl DecodeOptions {
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: Address) -> Self {
        self.target_address = Some(target);
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Accepts the wire flag: 0 = CALL, 1 = DELEGATECALL.
    pub fn with_operation_flag(self, flag: u8) -> Result<Self, DecodeError> {
        let operation = Operation::from_flag(flag)
            .ok_or_else(|| DecodeError::validation(format!("operation must be 0 or 1, got {flag}")))?;
        Ok(self.with_operation(operation))
    }

    pub fn with_profile(mut self, profile: TrustProfile) -> Self {
        self.profile = Some(Arc::new(profile));
        self
    }

    /// Validate and attach a trust profile given as JSON.
    pub fn with_profile_json(self, json: &str) -> Result<Self, DecodeError> {
        Ok(self.with_profile(TrustProfile::from_json(json)?))
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Where one call is sent and how.
#[derive(Debug, Clone, Copy)]
struct CallSite {
    target: Option<Address>,
    operation: Operation,
    value: U256,
}

/// The decode engine. Cheap to clone; lookups are shared.
#[derive(Clone)]
pub struct Decoder {
    registry: Arc<dyn AbiRegistry>,
    profile_abis: Arc<dyn ProfileAbiSource>,
    names: Arc<dyn NameLookup>,
    config: Arc<DecoderConfig>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            registry: Arc::new(NoAbiRegistry),
            profile_abis: Arc::new(NoProfileAbis),
            names: Arc::new(NoNameLookup),
            config: Arc::new(config),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn AbiRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_profile_abis(mut self, source: Arc<dyn ProfileAbiSource>) -> Self {
        self.profile_abis = source;
        self
    }

    pub fn with_name_lookup(mut self, names: Arc<dyn NameLookup>) -> Self {
        self.names = names;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode hex calldata into an effect and severity judgment.
    pub async fn decode(
        &self,
        calldata: &str,
        options: &DecodeOptions,
    ) -> Result<DecodeResult, DecodeError> {
        if options.offline && options.required_lookup == Some(LookupKind::Fourbyte) {
            return Err(DecodeError::validation(
                "the 4byte lookup was required but the request is offline",
            ));
        }
        let bytes = parse_calldata(calldata)?;
        let site = CallSite {
            target: options.target_address,
            operation: options.operation,
            value: options.value,
        };

        if !batch::is_multisend(&bytes) {
            let analysis = self.analyze_call(&bytes, site, options, None).await?;
            return Ok(DecodeResult {
                analysis,
                is_batch: false,
                batch_info: None,
            });
        }

        let records = batch::parse_multisend(&bytes, self.config.max_batch_calls)?;
        let calls = self.analyze_sub_calls(records, options).await?;
        let info = batch::summarize(calls);
        tracing::debug!(
            calls = info.call_count,
            overall = %info.batch_summary.overall_severity,
            "batch analysed"
        );
        let analysis = self.analyze_call(&bytes, site, options, Some(&info)).await?;
        Ok(DecodeResult {
            analysis,
            is_batch: true,
            batch_info: Some(info),
        })
    }

    /// Run every record concurrently, then restore payload order.
    async fn analyze_sub_calls(
        &self,
        records: Vec<BatchRecord>,
        options: &DecodeOptions,
    ) -> Result<Vec<SubCall>, DecodeError> {
        let count = records.len();
        let mut set = JoinSet::new();
        for (index, record) in records.into_iter().enumerate() {
            let decoder = self.clone();
            let options = options.clone();
            set.spawn(async move {
                let site = CallSite {
                    target: Some(record.to),
                    operation: record.operation,
                    value: record.value,
                };
                let analysis = decoder.analyze_call(&record.data, site, &options, None).await;
                (index, record, analysis)
            });
        }

        let mut slots: Vec<Option<SubCall>> = (0..count).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            let (index, record, analysis) =
                joined.map_err(|e| DecodeError::Aborted(e.to_string()))?;
            let analysis = analysis.map_err(|e| match e {
                DecodeError::InvalidCalldata(msg) => {
                    DecodeError::InvalidCalldata(format!("batch call #{index}: {msg}"))
                }
                other => other,
            })?;
            slots[index] = Some(SubCall {
                index,
                operation_label: record.operation,
                to: record.to,
                value: record.value,
                analysis,
            });
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DecodeError::Aborted("a batch call produced no result".to_owned()))
    }

    async fn analyze_call(
        &self,
        data: &[u8],
        site: CallSite,
        options: &DecodeOptions,
        batch: Option<&BatchInfo>,
    ) -> Result<CallAnalysis, DecodeError> {
        let profile = options.profile.as_deref();

        let (selector, identification) = match data.len() {
            0 => (None, None),
            1..=3 => {
                return Err(DecodeError::invalid(format!(
                    "calldata is {} bytes; a selector needs 4",
                    data.len()
                )))
            }
            _ => {
                let selector = Selector::from_slice(&data[..4]);
                let resolver = SelectorResolver {
                    catalog: SelectorCatalog::global(),
                    registry: self.registry.as_ref(),
                    profile_abis: self.profile_abis.as_ref(),
                    names: self.names.as_ref(),
                    name_timeout: Duration::from_millis(self.config.name_lookup_timeout_ms),
                };
                let request = ResolveRequest {
                    selector,
                    calldata: data,
                    target: site.target,
                    chain_id: options.chain_id,
                    profile,
                    offline: options.offline,
                    required_lookup: options.required_lookup,
                };
                (Some(selector), resolver.resolve(&request).await?)
            }
        };

        let trust_context = trust::classify(site.target, selector, profile);
        let subject = subject(selector, identification.as_ref());
        let effect = effects::analyze(&EffectInput {
            subject,
            trust: &trust_context,
            operation: site.operation,
            target: site.target,
            value: site.value,
            safe_address: profile.map(|p| p.safe_address),
            delegatecall_allowed: self.config.delegatecall_allowed(site.target),
            batch,
        });

        let header_severity = if trust_context.trust_blocked {
            Severity::Unknown
        } else {
            effect.severity
        };
        let source = identification.as_ref().map(|id| id.source);

        Ok(CallAnalysis {
            selector,
            function_name: identification.as_ref().and_then(|id| id.function_name.clone()),
            signature: identification.as_ref().and_then(|id| id.signature.clone()),
            source,
            verified: source.is_some_and(Source::verified),
            abi_verified: source.map_or(Some(false), Source::abi_verified),
            params: identification.and_then(|id| id.params),
            effect,
            trust_context,
            is_delegatecall: site.operation == Operation::Delegatecall,
            header_severity,
            target: site.target,
        })
    }
}

fn subject<'a>(selector: Option<Selector>, id: Option<&'a Identification>) -> Subject<'a> {
    match (selector, id) {
        (None, _) => Subject::NativeTransfer,
        (Some(_), None) => Subject::Unresolved { hint: None },
        (Some(_), Some(id)) if id.source == Source::Fourbyte => Subject::Unresolved {
            hint: id.function_name.as_deref(),
        },
        (Some(_), Some(id)) => Subject::Function {
            name: id.function_name.as_deref().unwrap_or("unknown"),
            source: id.source,
            template: id.template.unwrap_or(EffectTemplate::GenericCall),
            params: id.params.as_deref(),
        },
    }
}

/// Hex calldata, with or without `0x`.
pub fn parse_calldata(calldata: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = calldata.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| DecodeError::invalid(format!("calldata is not valid hex: {e}")))
}
