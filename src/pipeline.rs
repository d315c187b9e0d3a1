//! Export pipeline
//!
//! Builder output feeds the signer, both feed the packager. Each call is
//! independent: nothing is cached or shared between calls, so exports for
//! different batches can run in parallel against one registry.

use crate::archive::pack;
use crate::error::ExportResult;
use crate::export::build_export;
use crate::model::{BatchDescriptor, ExposureRecord, SignerConfig};
use crate::signing::{sign_export, SignerRegistry};

/// The two files of one export, before packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub export_bytes: Vec<u8>,
    pub signature_bytes: Vec<u8>,
}

/// Build and sign an export without packaging it.
pub fn build_artifact(
    batch: &BatchDescriptor,
    exposures: &[ExposureRecord],
    batch_num: u32,
    batch_size: u32,
    signers: &[SignerConfig],
    registry: &dyn SignerRegistry,
) -> ExportResult<ExportArtifact> {
    let export_bytes = build_export(batch, exposures, batch_num, batch_size, signers)?;
    let signature_bytes = sign_export(&export_bytes, batch_num, batch_size, signers, registry)?;
    Ok(ExportArtifact {
        export_bytes,
        signature_bytes,
    })
}

/// Produce the downloadable archive for one batch.
pub fn produce_export_archive(
    batch: &BatchDescriptor,
    exposures: &[ExposureRecord],
    batch_num: u32,
    batch_size: u32,
    signers: &[SignerConfig],
    registry: &dyn SignerRegistry,
) -> ExportResult<Vec<u8>> {
    let artifact = build_artifact(batch, exposures, batch_num, batch_size, signers, registry)?;
    let archive = pack(&artifact.export_bytes, &artifact.signature_bytes)?;

    tracing::info!(
        region = %batch.region,
        batch_num,
        batch_size,
        keys = exposures.len(),
        signers = signers.len(),
        archive_bytes = archive.len(),
        "produced export archive"
    );
    Ok(archive)
}
