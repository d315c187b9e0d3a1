//! Errors for the export pipeline
//!
//! Every failure aborts the export call. [`ExportError::kind`] groups the
//! variants into the four categories callers translate into responses.

use std::fmt;
use std::io;

use thiserror::Error;

/// Category of an [`ExportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller broke the input contract (batch numbering, malformed record).
    Contract,
    /// A value cannot be represented in the wire message.
    Serialization,
    /// Key resolution or signing failed.
    Crypto,
    /// The archive stream could not be completed.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contract => write!(f, "CONTRACT"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Crypto => write!(f, "CRYPTO"),
            Self::Io => write!(f, "IO"),
        }
    }
}

/// Errors from building, signing or packaging an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid batch number {batch_num} of {batch_size}")]
    InvalidBatchNumber { batch_num: u32, batch_size: u32 },

    #[error("batch window ends before it starts")]
    InvalidTimeWindow,

    #[error("exposure #{index}: {reason}")]
    InvalidExposure { index: usize, reason: String },

    #[error("cannot encode {field}: {reason}")]
    Serialization { field: &'static str, reason: String },

    #[error("no signing key registered for '{key_ref}'")]
    KeyNotFound { key_ref: String },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl ExportError {
    /// The error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidBatchNumber { .. }
            | Self::InvalidTimeWindow
            | Self::InvalidExposure { .. } => ErrorKind::Contract,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::KeyNotFound { .. } | Self::Signing(_) => ErrorKind::Crypto,
            Self::Io(_) | Self::Archive(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn serialization(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Serialization {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
