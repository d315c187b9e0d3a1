//! Binary export builder
//!
//! Produces `export.bin`: the fixed 16-byte header followed by a
//! `TemporaryExposureKeyExport` message. Output is a pure function of the
//! inputs, so the same batch, keys and signer descriptors always give the
//! same bytes.

use ek_proto::{SignatureInfo, TemporaryExposureKey, TemporaryExposureKeyExport};

use crate::error::{ExportError, ExportResult};
use crate::model::{
    BatchDescriptor, ExposureRecord, SignerConfig, KEY_LENGTH, MAX_TRANSMISSION_RISK,
};

/// Serialize a batch into `export.bin` bytes.
///
/// `batch_num` is 1-based and must not exceed `batch_size`. Keys are written
/// in ascending byte order whatever order `exposures` arrives in.
pub fn build_export(
    batch: &BatchDescriptor,
    exposures: &[ExposureRecord],
    batch_num: u32,
    batch_size: u32,
    signers: &[SignerConfig],
) -> ExportResult<Vec<u8>> {
    check_batch_numbering(batch_num, batch_size)?;
    if batch.end < batch.start {
        return Err(ExportError::InvalidTimeWindow);
    }

    let keys = sorted_keys(exposures)?
        .into_iter()
        .map(encode_key)
        .collect::<ExportResult<Vec<_>>>()?;

    let export = TemporaryExposureKeyExport {
        start_timestamp: Some(epoch_seconds("start_timestamp", batch.start.timestamp())?),
        end_timestamp: Some(epoch_seconds("end_timestamp", batch.end.timestamp())?),
        region: Some(batch.region.clone()),
        batch_num: Some(to_int32("batch_num", batch_num)?),
        batch_size: Some(to_int32("batch_size", batch_size)?),
        signature_infos: signers.iter().map(signature_info).collect(),
        keys,
    };

    let bytes = ek_proto::encode_export_file(&export);
    tracing::debug!(
        region = %batch.region,
        batch_num,
        batch_size,
        keys = export.keys.len(),
        signers = signers.len(),
        bytes = bytes.len(),
        "built export binary"
    );
    Ok(bytes)
}

/// Descriptor of a signer as it appears in both `export.bin` and
/// `export.sig`. Empty identity fields are left out.
pub fn signature_info(signer: &SignerConfig) -> SignatureInfo {
    SignatureInfo {
        app_bundle_id: non_empty(&signer.app_bundle_id),
        android_package: non_empty(&signer.android_package),
        verification_key_version: non_empty(&signer.key_version),
        verification_key_id: non_empty(&signer.key_id),
        signature_algorithm: Some(ek_proto::SIGNATURE_ALGORITHM.to_string()),
    }
}

/// Validate the caller-supplied batch position. Never corrected.
pub(crate) fn check_batch_numbering(batch_num: u32, batch_size: u32) -> ExportResult<()> {
    if batch_num == 0 || batch_size == 0 || batch_num > batch_size {
        return Err(ExportError::InvalidBatchNumber {
            batch_num,
            batch_size,
        });
    }
    Ok(())
}

pub(crate) fn to_int32(field: &'static str, value: u32) -> ExportResult<i32> {
    i32::try_from(value)
        .map_err(|_| ExportError::serialization(field, format!("{} exceeds int32", value)))
}

fn epoch_seconds(field: &'static str, seconds: i64) -> ExportResult<u64> {
    u64::try_from(seconds)
        .map_err(|_| ExportError::serialization(field, format!("{} is before the Unix epoch", seconds)))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Validate records and return them in export order.
fn sorted_keys(exposures: &[ExposureRecord]) -> ExportResult<Vec<&ExposureRecord>> {
    for (index, exposure) in exposures.iter().enumerate() {
        if exposure.key.is_empty() {
            return Err(ExportError::InvalidExposure {
                index,
                reason: "empty key data".to_string(),
            });
        }
        if exposure.transmission_risk > MAX_TRANSMISSION_RISK {
            return Err(ExportError::InvalidExposure {
                index,
                reason: format!(
                    "transmission risk {} outside 0..={}",
                    exposure.transmission_risk, MAX_TRANSMISSION_RISK
                ),
            });
        }
        if exposure.key.len() != KEY_LENGTH {
            tracing::warn!(
                index,
                len = exposure.key.len(),
                "exposure key is not {} bytes",
                KEY_LENGTH
            );
        }
    }

    let mut sorted: Vec<&ExposureRecord> = exposures.iter().collect();
    // Equal keys fall back to the remaining fields so ties are deterministic too.
    sorted.sort_by(|a, b| {
        a.key
            .cmp(&b.key)
            .then_with(|| a.transmission_risk.cmp(&b.transmission_risk))
            .then_with(|| a.rolling_start_interval.cmp(&b.rolling_start_interval))
            .then_with(|| a.rolling_period.cmp(&b.rolling_period))
    });
    Ok(sorted)
}

fn encode_key(exposure: &ExposureRecord) -> ExportResult<TemporaryExposureKey> {
    Ok(TemporaryExposureKey {
        key_data: Some(exposure.key.as_bytes().to_vec()),
        transmission_risk_level: Some(i32::from(exposure.transmission_risk)),
        rolling_start_interval_number: exposure
            .rolling_start_interval
            .map(|v| to_int32("rolling_start_interval_number", v))
            .transpose()?,
        rolling_period: exposure
            .rolling_period
            .map(|v| to_int32("rolling_period", v))
            .transpose()?,
    })
}
