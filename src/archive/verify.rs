//! Verification of export archives against published public keys
//!
//! Mirrors what a client does on download: unpack, check the header,
//! then check each signature entry over SHA-256(`export.bin`).

use std::collections::BTreeMap;
use std::io;

use ek_proto::{decode_signature_list, ExportFile, ProtoError, TemporaryExposureKeyExport};
use p256::ecdsa::VerifyingKey;
use serde::Serialize;
use thiserror::Error;

use super::ExportArchive;
use crate::signing::verify_export_signature;

/// Errors that prevent verification from running at all
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("unexpected archive entries: {0:?}")]
    UnexpectedEntries(Vec<String>),

    #[error("entry {name}: declared size {declared} but {actual} bytes")]
    SizeMismatch {
        name: String,
        declared: u64,
        actual: u64,
    },

    #[error("entry {name}: {size} bytes exceeds limit of {limit}")]
    EntryTooLarge {
        name: String,
        size: u64,
        limit: u64,
    },

    #[error("malformed export: {0}")]
    Proto(#[from] ProtoError),
}

/// Outcome for one signature entry
#[derive(Debug, Clone, Serialize)]
pub struct SignatureCheck {
    /// `verification_key_id` of the entry, if any
    pub key_id: Option<String>,
    pub key_version: Option<String>,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of verifying an archive
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub export: TemporaryExposureKeyExport,
    pub checks: Vec<SignatureCheck>,
}

impl VerificationReport {
    /// True when there is at least one signature and all of them verified.
    pub fn all_verified(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|c| c.verified)
    }
}

/// Verify every signature in an archive.
///
/// `trusted_keys` maps `verification_key_id` to its public key. Entries
/// with an unknown or missing key id are reported as failed, not fatal.
pub fn verify_archive(
    archive_bytes: &[u8],
    trusted_keys: &BTreeMap<String, VerifyingKey>,
) -> Result<VerificationReport, VerifyError> {
    let archive = ExportArchive::from_bytes(archive_bytes)?;
    let export = ExportFile::parse(&archive.export_bytes)?.export;
    let signatures = decode_signature_list(&archive.signature_bytes)?;

    let checks = signatures
        .signatures
        .iter()
        .map(|entry| {
            let info = entry.signature_info.clone().unwrap_or_default();
            let outcome = check_entry(
                &archive.export_bytes,
                &export,
                entry.batch_num,
                entry.batch_size,
                entry.signature(),
                info.verification_key_id.as_deref(),
                trusted_keys,
            );
            if let Err(ref reason) = outcome {
                tracing::warn!(key_id = ?info.verification_key_id, %reason, "signature check failed");
            }
            SignatureCheck {
                key_id: info.verification_key_id,
                key_version: info.verification_key_version,
                verified: outcome.is_ok(),
                error: outcome.err(),
            }
        })
        .collect();

    Ok(VerificationReport { export, checks })
}

fn check_entry(
    export_bytes: &[u8],
    export: &TemporaryExposureKeyExport,
    batch_num: Option<i32>,
    batch_size: Option<i32>,
    signature: &[u8],
    key_id: Option<&str>,
    trusted_keys: &BTreeMap<String, VerifyingKey>,
) -> Result<(), String> {
    if batch_num != export.batch_num || batch_size != export.batch_size {
        return Err(format!(
            "batch {:?}/{:?} does not match export {:?}/{:?}",
            batch_num, batch_size, export.batch_num, export.batch_size
        ));
    }

    let key_id = key_id.ok_or_else(|| "entry has no verification key id".to_string())?;
    let key = trusted_keys
        .get(key_id)
        .ok_or_else(|| format!("no trusted key for '{}'", key_id))?;

    verify_export_signature(export_bytes, signature, key)
}
