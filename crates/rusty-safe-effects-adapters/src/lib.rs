pub mod config;
pub mod error;
mod files;
pub mod profile_abis;
pub mod profile_store;
pub mod registry;
pub mod sourcify;
pub mod telemetry;

pub use config::AdapterConfig;
pub use error::AdapterError;
pub use profile_abis::FileProfileAbiSource;
pub use profile_store::load_trust_profile;
pub use registry::FileAbiRegistry;
pub use sourcify::{SignatureInfo, SignatureLookup};
pub use telemetry::init_tracing;

use std::sync::Arc;

use rusty_safe_effects::{Decoder, DecoderConfig};

/// A decoder wired to the file registry, file profile ABIs and Sourcify.
pub fn decoder_from_config(
    adapters: &AdapterConfig,
    decoder: DecoderConfig,
) -> Result<Decoder, AdapterError> {
    Ok(Decoder::new(decoder)
        .with_registry(Arc::new(FileAbiRegistry::from_config(adapters)))
        .with_profile_abis(Arc::new(FileProfileAbiSource::from_config(adapters)))
        .with_name_lookup(Arc::new(SignatureLookup::new(adapters)?)))
}
