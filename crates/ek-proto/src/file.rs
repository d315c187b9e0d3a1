//! Framing of `export.bin`: fixed header followed by the export message.

use prost::Message;

use crate::error::ProtoError;
use crate::messages::{TekSignatureList, TemporaryExposureKeyExport};
use crate::{EXPORT_HEADER, FIXED_HEADER_WIDTH};

/// Serialize an export message with its fixed header.
pub fn encode_export_file(export: &TemporaryExposureKeyExport) -> Vec<u8> {
    let mut out = Vec::with_capacity(FIXED_HEADER_WIDTH + export.encoded_len());
    out.extend_from_slice(EXPORT_HEADER);
    out.extend_from_slice(&export.encode_to_vec());
    out
}

/// A parsed `export.bin`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub export: TemporaryExposureKeyExport,
}

impl ExportFile {
    /// Parse `export.bin` bytes, checking the header.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtoError> {
        if bytes.len() < FIXED_HEADER_WIDTH {
            return Err(ProtoError::Truncated {
                len: bytes.len(),
                needed: FIXED_HEADER_WIDTH,
            });
        }

        let (header, body) = bytes.split_at(FIXED_HEADER_WIDTH);
        if header != EXPORT_HEADER {
            return Err(ProtoError::BadHeader {
                found: String::from_utf8_lossy(header).into_owned(),
            });
        }

        let export = TemporaryExposureKeyExport::decode(body)?;
        Ok(Self { export })
    }

    /// Key data of every key, in file order.
    pub fn key_data(&self) -> Vec<&[u8]> {
        self.export.keys.iter().map(|k| k.key_data()).collect()
    }
}

/// Decode `export.sig` bytes.
pub fn decode_signature_list(bytes: &[u8]) -> Result<TekSignatureList, ProtoError> {
    Ok(TekSignatureList::decode(bytes)?)
}
