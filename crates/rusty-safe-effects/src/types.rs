//! Decode result types

use std::fmt;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Selector, U256};
use serde::{Deserialize, Serialize};

use crate::profile::TrustLevel;

// =============================================================================
// SEVERITY
// =============================================================================

/// Risk grade of a decoded operation.
///
/// Definite grades are totally ordered `Ok < Warn < Danger < High < Critical`.
/// `Unknown` means "cannot be determined" and sits outside that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Ok,
    Warn,
    Danger,
    High,
    Critical,
    Unknown,
}

impl Severity {
    /// Position in the definite order, `None` for `Unknown`.
    pub fn rank(self) -> Option<u8> {
        match self {
            Severity::Ok => Some(0),
            Severity::Warn => Some(1),
            Severity::Danger => Some(2),
            Severity::High => Some(3),
            Severity::Critical => Some(4),
            Severity::Unknown => None,
        }
    }

    /// One step toward `Critical`. `Unknown` is never escalated.
    pub fn escalate(self) -> Self {
        match self {
            Severity::Ok => Severity::Warn,
            Severity::Warn => Severity::Danger,
            Severity::Danger => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
            Severity::Unknown => Severity::Unknown,
        }
    }

    /// The more severe of two definite grades; `Unknown` dominates.
    pub fn worst(self, other: Severity) -> Severity {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => {
                if b > a {
                    other
                } else {
                    self
                }
            }
            _ => Severity::Unknown,
        }
    }

    /// Fold into the four-bucket view used by batch summaries.
    pub fn bucket(self) -> SeverityBucket {
        match self {
            Severity::Ok => SeverityBucket::Ok,
            Severity::Warn => SeverityBucket::Warn,
            Severity::Danger | Severity::High | Severity::Critical => SeverityBucket::Danger,
            Severity::Unknown => SeverityBucket::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warn => "WARN",
            Severity::Danger => "DANGER",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityBucket {
    Ok,
    Warn,
    Danger,
    Unknown,
}

// =============================================================================
// IDENTIFICATION SOURCES
// =============================================================================

/// Where a function identity came from, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    VerifiedDatabase,
    LocalRegistry,
    TrustProfileAbi,
    TrustProfile,
    Fourbyte,
}

impl Source {
    pub fn verified(self) -> bool {
        matches!(self, Source::VerifiedDatabase)
    }

    /// `None` where the flag does not apply (the verified database).
    pub fn abi_verified(self) -> Option<bool> {
        match self {
            Source::VerifiedDatabase => None,
            Source::LocalRegistry | Source::TrustProfileAbi => Some(true),
            Source::TrustProfile | Source::Fourbyte => Some(false),
        }
    }

    /// Sources that carry an ABI fragment and so can decode parameters.
    pub fn has_abi(self) -> bool {
        matches!(
            self,
            Source::VerifiedDatabase | Source::LocalRegistry | Source::TrustProfileAbi
        )
    }
}

/// External lookups a caller may insist on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LookupKind {
    LocalRegistry,
    TrustProfileAbi,
    Fourbyte,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LookupKind::LocalRegistry => "local ABI registry",
            LookupKind::TrustProfileAbi => "trust profile ABI",
            LookupKind::Fourbyte => "4byte name service",
        })
    }
}

// =============================================================================
// CALL SHAPE
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    #[default]
    Call,
    Delegatecall,
}

impl Operation {
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Operation::Call),
            1 => Some(Operation::Delegatecall),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Call => "CALL",
            Operation::Delegatecall => "DELEGATECALL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permanence {
    Permanent,
    PermanentUntilRevoked,
    Temporary,
    Immediate,
    OneTime,
}

/// Closed set of consequence families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectCategory {
    Approval,
    Transfer,
    Dex,
    Ownership,
    ProxyUpgrade,
    SafeAdmin,
    Batch,
    ContractCall,
}

/// Consequence template a function is analysed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectTemplate {
    Approve,
    IncreaseAllowance,
    DecreaseAllowance,
    Permit,
    SetApprovalForAll,
    Transfer,
    TransferFrom,
    NftTransfer,
    NativeTransfer,
    SwapV2,
    SwapV3Single,
    TransferOwnership,
    RenounceOwnership,
    UpgradeTo,
    UpgradeToAndCall,
    ChangeProxyAdmin,
    AddOwner,
    RemoveOwner,
    SwapOwner,
    ChangeThreshold,
    EnableModule,
    DisableModule,
    SetGuard,
    SetFallbackHandler,
    MultiSend,
    GenericCall,
}

impl EffectTemplate {
    pub fn category(self) -> EffectCategory {
        use EffectTemplate::*;
        match self {
            Approve | IncreaseAllowance | DecreaseAllowance | Permit | SetApprovalForAll => {
                EffectCategory::Approval
            }
            Transfer | TransferFrom | NftTransfer | NativeTransfer => EffectCategory::Transfer,
            SwapV2 | SwapV3Single => EffectCategory::Dex,
            TransferOwnership | RenounceOwnership => EffectCategory::Ownership,
            UpgradeTo | UpgradeToAndCall | ChangeProxyAdmin => EffectCategory::ProxyUpgrade,
            AddOwner | RemoveOwner | SwapOwner | ChangeThreshold | EnableModule | DisableModule
            | SetGuard | SetFallbackHandler => EffectCategory::SafeAdmin,
            MultiSend => EffectCategory::Batch,
            GenericCall => EffectCategory::ContractCall,
        }
    }
}

// =============================================================================
// PARAMETERS
// =============================================================================

/// A decoded argument, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedParam {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub value: String,
    /// `type(uint256).max`, the canonical "unlimited" sentinel.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unlimited: bool,
    #[serde(skip)]
    pub raw: DynSolValue,
}

impl DecodedParam {
    pub fn as_address(&self) -> Option<Address> {
        self.raw.as_address()
    }

    pub fn as_uint(&self) -> Option<U256> {
        self.raw.as_uint().map(|(v, _)| v)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.raw.as_bool()
    }
}

/// Lookup helpers over an ordered parameter list.
pub trait ParamsExt {
    fn param(&self, index: usize) -> Option<&DecodedParam>;
    fn address_at(&self, index: usize) -> Option<Address>;
    fn uint_at(&self, index: usize) -> Option<U256>;
}

impl ParamsExt for [DecodedParam] {
    fn param(&self, index: usize) -> Option<&DecodedParam> {
        self.get(index)
    }

    fn address_at(&self, index: usize) -> Option<Address> {
        self.get(index).and_then(DecodedParam::as_address)
    }

    fn uint_at(&self, index: usize) -> Option<U256> {
        self.get(index).and_then(DecodedParam::as_uint)
    }
}

// =============================================================================
// EFFECT + TRUST
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectModel {
    pub effect_type: EffectCategory,
    pub label: String,
    pub permanence: Permanence,
    pub beneficiary: Option<Address>,
    pub consequences: Vec<String>,
    pub warnings: Vec<String>,
    pub mitigations: Vec<String>,
    pub severity: Severity,
    /// Set when DELEGATECALL forced the severity.
    pub delegatecall_override: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractClassification {
    Trusted,
    Watched,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectorClassification {
    Expected,
    Unusual,
    NeverUsed,
    NotAllowed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustContext {
    pub profile_loaded: bool,
    pub contract_classification: ContractClassification,
    pub selector_classification: Option<SelectorClassification>,
    pub trust_level: Option<TrustLevel>,
    pub label: Option<String>,
    pub selector_label: Option<String>,
    pub warnings: Vec<String>,
    pub notes: Option<String>,
    pub trust_blocked: bool,
}

impl TrustContext {
    /// Context for a decode without a trust profile.
    pub fn unloaded() -> Self {
        Self {
            profile_loaded: false,
            contract_classification: ContractClassification::Unknown,
            selector_classification: None,
            trust_level: None,
            label: None,
            selector_label: None,
            warnings: Vec::new(),
            notes: None,
            trust_blocked: false,
        }
    }

    /// The profile vouches for both the contract and this selector.
    pub fn vouches(&self) -> bool {
        self.profile_loaded
            && !self.trust_blocked
            && self.contract_classification == ContractClassification::Trusted
            && matches!(
                self.selector_classification,
                Some(
                    SelectorClassification::Expected
                        | SelectorClassification::Unusual
                        | SelectorClassification::NeverUsed
                )
            )
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Analysis of one call, shared by top-level results and batch sub-calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAnalysis {
    pub selector: Option<Selector>,
    pub function_name: Option<String>,
    pub signature: Option<String>,
    pub source: Option<Source>,
    pub verified: bool,
    pub abi_verified: Option<bool>,
    pub params: Option<Vec<DecodedParam>>,
    pub effect: EffectModel,
    pub trust_context: TrustContext,
    pub is_delegatecall: bool,
    pub header_severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Address>,
}

/// Full answer to a `decode` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeResult {
    #[serde(flatten)]
    pub analysis: CallAnalysis,
    pub is_batch: bool,
    pub batch_info: Option<BatchInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCall {
    pub index: usize,
    pub operation_label: Operation,
    pub to: Address,
    pub value: U256,
    pub analysis: CallAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    pub calls: Vec<SubCall>,
    pub call_count: usize,
    pub batch_summary: BatchSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub counts: BucketCounts,
    pub overall_severity: Severity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct BucketCounts {
    pub ok: usize,
    pub warn: usize,
    pub danger: usize,
    pub unknown: usize,
}

impl BucketCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity.bucket() {
            SeverityBucket::Ok => self.ok += 1,
            SeverityBucket::Warn => self.warn += 1,
            SeverityBucket::Danger => self.danger += 1,
            SeverityBucket::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, bucket: SeverityBucket) -> usize {
        match bucket {
            SeverityBucket::Ok => self.ok,
            SeverityBucket::Warn => self.warn,
            SeverityBucket::Danger => self.danger,
            SeverityBucket::Unknown => self.unknown,
        }
    }
}
