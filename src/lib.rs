//! ek-export - signed diagnosis key export archives
//!
//! Builds the `export.bin` / `export.sig` pair consumed by exposure
//! notification clients and bundles them into a zip archive. Each signer's
//! signature is made with that signer's own key from a [`SignerRegistry`].

pub mod archive;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod signing;

pub use archive::{pack, verify_archive, ExportArchive, VerificationReport};
pub use config::{ConfigError, ExportConfig};
pub use error::{ErrorKind, ExportError, ExportResult};
pub use export::build_export;
pub use model::{BatchDescriptor, ExposureKey, ExposureRecord, SignerConfig};
pub use pipeline::{build_artifact, produce_export_archive, ExportArtifact};
pub use signing::{sign_export, KeySigner, KeyStore, SignerRegistry};
