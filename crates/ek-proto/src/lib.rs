//! Exposure Key Export wire format
//!
//! Defines the `export.bin` / `export.sig` messages consumed by exposure
//! notification clients, the fixed file header, and helpers to parse a
//! serialized export file back into its message.

pub mod error;
pub mod file;
pub mod messages;

pub use error::ProtoError;
pub use file::{decode_signature_list, encode_export_file, ExportFile};
pub use messages::{
    SignatureInfo, TekSignature, TekSignatureList, TemporaryExposureKey,
    TemporaryExposureKeyExport,
};

/// Header text at the start of every `export.bin`, before padding.
pub const EXPORT_HEADER_TEXT: &str = "EK Export v1";

/// Width of the fixed header in bytes.
pub const FIXED_HEADER_WIDTH: usize = 16;

/// The fixed header: [`EXPORT_HEADER_TEXT`] right-padded with spaces.
pub const EXPORT_HEADER: &[u8; FIXED_HEADER_WIDTH] = b"EK Export v1    ";

/// Object identifier for ECDSA with SHA-256.
pub const SIGNATURE_ALGORITHM: &str = "1.2.840.10045.4.3.2";

/// Archive entry name of the binary export.
pub const EXPORT_BINARY_NAME: &str = "export.bin";

/// Archive entry name of the signature list.
pub const EXPORT_SIGNATURE_NAME: &str = "export.sig";

/// Rolling period clients assume when the field is absent (one day of
/// 10-minute intervals).
pub const DEFAULT_ROLLING_PERIOD: i32 = 144;
