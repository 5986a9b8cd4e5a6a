pub mod batch;
pub mod catalog;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod explain;
pub mod params;
pub mod ports;
pub mod profile;
pub mod resolver;
pub mod trust;
pub mod types;

pub use catalog::{SelectorCatalog, SelectorEntry, MULTISEND_SELECTOR};
pub use config::{DecoderConfig, DEFAULT_DELEGATECALL_ALLOWLIST};
pub use engine::{parse_calldata, DecodeOptions, Decoder};
pub use error::{DecodeError, LookupError, ParamDecodeError};
pub use explain::{prepare as explain, Explanation, FixedResponse, Prompt, PromptMetadata};
pub use ports::{AbiEntry, AbiRegistry, NameHint, NameLookup, ProfileAbiSource};
pub use profile::{parse_address, parse_selector, TrustLevel, TrustProfile, TrustedContractConfig};
pub use types::{
    BatchInfo, BucketCounts, CallAnalysis, ContractClassification, DecodeResult, DecodedParam,
    EffectCategory, EffectModel, LookupKind, Operation, Permanence, SelectorClassification,
    Severity, Source, SubCall, TrustContext,
};
