//! Signature generation for export files
//!
//! Produces `export.sig`: one `TEKSignature` per signer, each an ECDSA
//! P-256 signature over the SHA-256 digest of the exact `export.bin` bytes,
//! made with that signer's own key from the registry.

pub mod keys;

pub use keys::{
    decode_private_key_pem, decode_public_key_pem, encode_private_key_pem,
    generate_signing_key, key_fingerprint, public_key_pem, write_key_pair, KeySigner,
    KeyStore, KeyStoreError, SignerRegistry,
};

use ek_proto::{TekSignature, TekSignatureList};
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use prost::Message;
use sha2::{Digest, Sha256};

use crate::error::{ExportError, ExportResult};
use crate::export::{check_batch_numbering, signature_info, to_int32};
use crate::model::SignerConfig;

/// SHA-256 of the export file bytes.
pub fn export_digest(export_bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(export_bytes).into()
}

/// Sign `export_bytes` once per signer and serialize the signature list.
///
/// Fails without output if any signer's key cannot be resolved or signing
/// fails; a partial list is never returned.
pub fn sign_export(
    export_bytes: &[u8],
    batch_num: u32,
    batch_size: u32,
    signers: &[SignerConfig],
    registry: &dyn SignerRegistry,
) -> ExportResult<Vec<u8>> {
    check_batch_numbering(batch_num, batch_size)?;
    let batch_num = to_int32("batch_num", batch_num)?;
    let batch_size = to_int32("batch_size", batch_size)?;

    let digest = export_digest(export_bytes);

    let signatures = signers
        .iter()
        .map(|signer| -> ExportResult<TekSignature> {
            let key = registry
                .resolve(&signer.key_ref)
                .ok_or_else(|| ExportError::KeyNotFound {
                    key_ref: signer.key_ref.clone(),
                })?;
            let signature = key.sign_digest(&digest)?;
            tracing::debug!(key_ref = %signer.key_ref, "signed export");

            Ok(TekSignature {
                signature_info: Some(signature_info(signer)),
                batch_num: Some(batch_num),
                batch_size: Some(batch_size),
                signature: Some(signature),
            })
        })
        .collect::<ExportResult<Vec<_>>>()?;

    Ok(TekSignatureList { signatures }.encode_to_vec())
}

/// Check a DER signature over `export_bytes` against a public key.
pub fn verify_export_signature(
    export_bytes: &[u8],
    der_signature: &[u8],
    key: &VerifyingKey,
) -> Result<(), String> {
    let signature =
        Signature::from_der(der_signature).map_err(|e| format!("malformed signature: {}", e))?;
    key.verify_prehash(&export_digest(export_bytes), &signature)
        .map_err(|_| "signature does not match".to_string())
}
