//! Errors raised while parsing export files.

use thiserror::Error;

/// Errors from reading `export.bin` or `export.sig` bytes.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Input shorter than the fixed header.
    #[error("export file truncated: {len} bytes, header needs {needed}")]
    Truncated { len: usize, needed: usize },

    /// The first 16 bytes are not the export header.
    #[error("bad export header: {found:?}")]
    BadHeader { found: String },

    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}
