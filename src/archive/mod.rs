//! Export archive packaging
//!
//! Bundles `export.bin` and `export.sig` into the zip clients download.
//! Archives are built entirely in memory and returned only once complete.
//! Entry metadata is normalized (fixed timestamp, fixed mode) so packing
//! the same bytes twice yields the same archive.

pub mod verify;

pub use verify::{verify_archive, SignatureCheck, VerificationReport, VerifyError};

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use ek_proto::{EXPORT_BINARY_NAME, EXPORT_SIGNATURE_NAME};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ExportResult;

/// Entry names, in archive order.
pub const ENTRY_NAMES: [&str; 2] = [EXPORT_BINARY_NAME, EXPORT_SIGNATURE_NAME];

/// Largest entry accepted when reading an archive (64 MiB).
pub const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644)
}

/// Pack the export and signature files into a zip archive.
pub fn pack(export_bytes: &[u8], signature_bytes: &[u8]) -> ExportResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, contents) in ENTRY_NAMES.iter().zip([export_bytes, signature_bytes]) {
        zip.start_file(*name, entry_options())?;
        zip.write_all(contents)?;
    }

    let archive = zip.finish()?.into_inner();
    tracing::debug!(
        export_bytes = export_bytes.len(),
        signature_bytes = signature_bytes.len(),
        archive_bytes = archive.len(),
        "packed export archive"
    );
    Ok(archive)
}

/// The two payloads of an export archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArchive {
    pub export_bytes: Vec<u8>,
    pub signature_bytes: Vec<u8>,
}

impl ExportArchive {
    /// Read an archive produced by [`pack`].
    ///
    /// The archive must hold exactly `export.bin` then `export.sig`, each
    /// with a declared size equal to its contents.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VerifyError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;

        let names: Vec<String> = zip.file_names().map(str::to_string).collect();
        if zip.len() != ENTRY_NAMES.len() {
            return Err(VerifyError::UnexpectedEntries(names));
        }

        let mut payloads = Vec::with_capacity(ENTRY_NAMES.len());
        for (index, expected) in ENTRY_NAMES.iter().enumerate() {
            let mut file = zip.by_index(index)?;
            if file.name() != *expected {
                return Err(VerifyError::UnexpectedEntries(names));
            }

            let declared = file.size();
            payloads.push(read_entry(&mut file, expected, declared, MAX_ENTRY_SIZE)?);
        }

        let signature_bytes = payloads.pop().unwrap_or_default();
        let export_bytes = payloads.pop().unwrap_or_default();
        Ok(Self {
            export_bytes,
            signature_bytes,
        })
    }

    /// Load and read an archive file.
    pub fn from_file(path: &Path) -> Result<Self, VerifyError> {
        Self::from_bytes(&fs::read(path)?)
    }
}

/// Read one entry, never buffering more than one byte past `declared`.
fn read_entry<R: Read>(
    reader: R,
    name: &str,
    declared: u64,
    limit: u64,
) -> Result<Vec<u8>, VerifyError> {
    if declared > limit {
        return Err(VerifyError::EntryTooLarge {
            name: name.to_string(),
            size: declared,
            limit,
        });
    }

    let mut contents = Vec::new();
    reader.take(declared + 1).read_to_end(&mut contents)?;
    if contents.len() as u64 != declared {
        return Err(VerifyError::SizeMismatch {
            name: name.to_string(),
            declared,
            actual: contents.len() as u64,
        });
    }
    Ok(contents)
}

/// Write an archive to `path` via a temporary sibling and rename, so the
/// destination never holds a partial archive.
pub fn write_archive(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export.zip".to_string());
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let result = fs::write(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
