//! Narration gate
//!
//! Decides whether a finished result may be handed to an external narrator
//! and builds the provider-agnostic prompt. Results nobody can vouch for get a
//! fixed response instead.

use serde::Serialize;

use crate::types::{CallAnalysis, DecodeResult, Severity, Source};

pub const UNVERIFIED_SUMMARY: &str =
    "This function could not be verified. Review the raw calldata and the target contract before signing.";

const SYSTEM_PROMPT: &str = "You explain Ethereum Safe transactions to the owners who must sign them. \
Describe only the effects listed in the analysis. Do not speculate about code you have not been shown, \
do not lower the stated severity, and say plainly when something is irreversible.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    #[serde(rename = "skipAI")]
    pub skip_ai: bool,
    pub prompt: Prompt,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub metadata: PromptMetadata,
    pub fixed_response: Option<FixedResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptMetadata {
    pub source: Option<Source>,
    pub severity: Severity,
    pub verified: bool,
    pub trust_profile_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixedResponse {
    pub summary: String,
    pub warnings: Vec<String>,
}

pub fn prepare(result: &DecodeResult) -> Explanation {
    let analysis = &result.analysis;
    let trust = &analysis.trust_context;
    let trust_profile_verified = trust.vouches();
    let skip_ai = should_skip(analysis);

    let metadata = PromptMetadata {
        source: analysis.source,
        severity: analysis.header_severity,
        verified: analysis.verified,
        trust_profile_verified,
        contract_label: trust.label.clone(),
        function_label: trust.selector_label.clone().or_else(|| trusted_name(analysis)),
    };

    let fixed_response = skip_ai.then(|| FixedResponse {
        summary: UNVERIFIED_SUMMARY.to_owned(),
        warnings: analysis.effect.warnings.clone(),
    });

    if skip_ai {
        tracing::debug!(source = ?analysis.source, blocked = trust.trust_blocked, "narration skipped");
    }

    Explanation {
        skip_ai,
        prompt: Prompt {
            system: SYSTEM_PROMPT.to_owned(),
            user: user_prompt(result, &metadata),
            metadata,
            fixed_response,
        },
    }
}

/// Nothing safe to narrate: blocked, or neither ABI-backed nor vouched for.
fn should_skip(analysis: &CallAnalysis) -> bool {
    if analysis.trust_context.trust_blocked {
        return true;
    }
    let native_transfer = analysis.selector.is_none();
    let abi_backed = analysis.source.is_some_and(Source::has_abi);
    !(native_transfer || abi_backed || analysis.trust_context.vouches())
}

fn user_prompt(result: &DecodeResult, metadata: &PromptMetadata) -> String {
    let analysis = &result.analysis;
    let mut lines = vec![verification_line(analysis, metadata)];

    if let Some(label) = &metadata.contract_label {
        lines.push(format!("Target contract: {label}"));
    }
    match (&analysis.signature, analysis.source) {
        (Some(signature), Some(Source::Fourbyte)) => {
            lines.push(format!("Signature (unverified): {signature}"));
        }
        (Some(signature), _) => lines.push(format!("Signature: {signature}")),
        (None, _) => {}
    }
    if let Some(params) = &analysis.params {
        for p in params {
            lines.push(format!("Param {} ({}): {}", p.name, p.typ, p.value));
        }
    }
    if analysis.is_delegatecall {
        lines.push("Operation: DELEGATECALL".to_owned());
    }

    let effect = &analysis.effect;
    lines.push(format!("Effect: {} [{}]", effect.label, analysis.header_severity));
    lines.extend(effect.consequences.iter().map(|c| format!("- {c}")));
    lines.extend(effect.warnings.iter().map(|w| format!("Warning: {w}")));

    if let Some(batch) = &result.batch_info {
        lines.push(format!("Batch of {} calls, executed in order:", batch.call_count));
        for call in &batch.calls {
            lines.push(format!(
                "{}. {} {} {} [{}]",
                call.index + 1,
                call.operation_label.as_str(),
                call.to,
                display_name(&call.analysis),
                call.analysis.header_severity
            ));
        }
    }
    lines.join("\n")
}

/// The function name, unless it came from the public 4byte database.
fn trusted_name(analysis: &CallAnalysis) -> Option<String> {
    match analysis.source {
        Some(Source::Fourbyte) => None,
        _ => analysis.function_name.clone(),
    }
}

fn display_name(analysis: &CallAnalysis) -> String {
    match (&analysis.function_name, analysis.source) {
        (Some(name), Some(Source::Fourbyte)) => format!("{name} (unverified name)"),
        (Some(name), _) => name.clone(),
        (None, _) => "unknown function".to_owned(),
    }
}

fn verification_line(analysis: &CallAnalysis, metadata: &PromptMetadata) -> String {
    let name = analysis.function_name.as_deref().unwrap_or("unknown function");
    match analysis.source {
        Some(Source::VerifiedDatabase) => {
            format!("Verification: {name} matched the verified selector database.")
        }
        Some(Source::LocalRegistry) => {
            format!("Verification: {name} decoded with an ABI from the local registry (not independently verified).")
        }
        Some(Source::TrustProfileAbi) => {
            format!("Verification: {name} decoded with an ABI referenced by the trust profile.")
        }
        Some(Source::TrustProfile) => {
            let level = analysis
                .trust_context
                .trust_level
                .map(|l| l.as_str())
                .unwrap_or("UNSPECIFIED");
            let label = metadata.function_label.as_deref().unwrap_or(name);
            format!(
                "Verification: the trust profile lists this contract at trust level {level} and labels the function \"{label}\". Parameters were not decoded."
            )
        }
        Some(Source::Fourbyte) => {
            format!("Verification: none. The name {name} comes from an unverified public database.")
        }
        None if analysis.selector.is_none() => {
            "Verification: plain value transfer with no calldata.".to_owned()
        }
        None => "Verification: none. The function could not be identified.".to_owned(),
    }
}
