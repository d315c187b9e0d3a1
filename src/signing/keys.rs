//! Signer key access
//!
//! Each signer has a durable P-256 key held by a registry outside the
//! signing path. The registry hands out a [`KeySigner`] per key reference;
//! the private key itself never leaves it.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::{ExportError, ExportResult};

/// File extension of private keys in a key directory.
pub const PRIVATE_KEY_EXTENSION: &str = "pem";

/// Suffix of public key files written next to private keys.
pub const PUBLIC_KEY_SUFFIX: &str = ".pub.pem";

/// Errors from loading or storing keys
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid key '{key_ref}': {reason}")]
    InvalidKey { key_ref: String, reason: String },

    #[error("duplicate key reference: '{0}'")]
    DuplicateKey(String),

    #[error("key directory not found: {0}")]
    NotFound(String),

    #[error("key '{0}' already exists")]
    KeyExists(String),
}

/// Capability to sign a SHA-256 digest with one specific key.
pub trait KeySigner: Send + Sync {
    /// Sign `digest`, returning a DER-encoded ECDSA signature.
    fn sign_digest(&self, digest: &[u8; 32]) -> ExportResult<Vec<u8>>;
}

impl KeySigner for SigningKey {
    fn sign_digest(&self, digest: &[u8; 32]) -> ExportResult<Vec<u8>> {
        let signature = PrehashSigner::<Signature>::sign_prehash(self, digest)
            .map_err(|e| ExportError::Signing(e.to_string()))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

/// Source of signing keys, looked up by [`crate::SignerConfig::key_ref`].
///
/// Implementations are shared across concurrent exports and must be safe
/// for concurrent reads.
pub trait SignerRegistry: Send + Sync {
    fn resolve(&self, key_ref: &str) -> Option<&dyn KeySigner>;
}

/// In-memory registry of P-256 signing keys.
#[derive(Default)]
pub struct KeyStore {
    keys: BTreeMap<String, SigningKey>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<key_ref>.pem` PKCS#8 private key in `dir`.
    ///
    /// Public key files (`*.pub.pem`) are skipped.
    pub fn load_dir(dir: &Path) -> Result<Self, KeyStoreError> {
        if !dir.is_dir() {
            return Err(KeyStoreError::NotFound(dir.display().to_string()));
        }

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        paths.sort();

        let mut store = Self::new();
        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(PUBLIC_KEY_SUFFIX) {
                continue;
            }
            let Some(key_ref) = name.strip_suffix(&format!(".{}", PRIVATE_KEY_EXTENSION)) else {
                continue;
            };

            let pem = fs::read_to_string(&path)?;
            let key = decode_private_key_pem(key_ref, &pem)?;
            store.insert(key_ref, key)?;
        }

        tracing::debug!(dir = %dir.display(), keys = store.len(), "loaded signing keys");
        Ok(store)
    }

    /// Register a key under `key_ref`.
    pub fn insert(&mut self, key_ref: impl Into<String>, key: SigningKey) -> Result<(), KeyStoreError> {
        let key_ref = key_ref.into();
        if self.keys.contains_key(&key_ref) {
            return Err(KeyStoreError::DuplicateKey(key_ref));
        }
        self.keys.insert(key_ref, key);
        Ok(())
    }

    /// Generate and register a fresh key, returning its public half.
    pub fn generate(&mut self, key_ref: impl Into<String>) -> Result<VerifyingKey, KeyStoreError> {
        let key = generate_signing_key();
        let verifying = *key.verifying_key();
        self.insert(key_ref, key)?;
        Ok(verifying)
    }

    /// Public key for `key_ref`, for publishing to clients.
    pub fn verifying_key(&self, key_ref: &str) -> Option<VerifyingKey> {
        self.keys.get(key_ref).map(|k| *k.verifying_key())
    }

    pub fn key_refs(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SignerRegistry for KeyStore {
    fn resolve(&self, key_ref: &str) -> Option<&dyn KeySigner> {
        self.keys.get(key_ref).map(|k| k as &dyn KeySigner)
    }
}

/// Generate a new P-256 signing key.
pub fn generate_signing_key() -> SigningKey {
    SigningKey::random(&mut rand::rngs::OsRng)
}

/// SHA-256 fingerprint (hex) of the uncompressed SEC1 public key.
pub fn key_fingerprint(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    hex::encode(Sha256::digest(point.as_bytes()))
}

/// Encode a private key as PKCS#8 PEM.
pub fn encode_private_key_pem(key: &SigningKey) -> Result<String, KeyStoreError> {
    key.to_pkcs8_pem(LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|e| KeyStoreError::InvalidKey {
            key_ref: String::new(),
            reason: e.to_string(),
        })
}

/// Decode a PKCS#8 PEM private key.
pub fn decode_private_key_pem(key_ref: &str, pem: &str) -> Result<SigningKey, KeyStoreError> {
    SigningKey::from_pkcs8_pem(pem).map_err(|e| KeyStoreError::InvalidKey {
        key_ref: key_ref.to_string(),
        reason: e.to_string(),
    })
}

/// Encode a public key as SubjectPublicKeyInfo PEM.
pub fn public_key_pem(key: &VerifyingKey) -> Result<String, KeyStoreError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyStoreError::InvalidKey {
            key_ref: String::new(),
            reason: e.to_string(),
        })
}

/// Decode a SubjectPublicKeyInfo PEM public key.
pub fn decode_public_key_pem(key_ref: &str, pem: &str) -> Result<VerifyingKey, KeyStoreError> {
    VerifyingKey::from_public_key_pem(pem).map_err(|e| KeyStoreError::InvalidKey {
        key_ref: key_ref.to_string(),
        reason: e.to_string(),
    })
}

/// Write `<key_ref>.pem` and `<key_ref>.pub.pem` into `dir`.
///
/// The private key file must not already exist; on unix it is created
/// with mode 0600.
pub fn write_key_pair(dir: &Path, key_ref: &str, key: &SigningKey) -> Result<(), KeyStoreError> {
    fs::create_dir_all(dir)?;
    let private_pem = encode_private_key_pem(key)?;
    let public_pem = public_key_pem(key.verifying_key())?;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let private_path = dir.join(format!("{}.{}", key_ref, PRIVATE_KEY_EXTENSION));
    let mut file = options.open(&private_path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => KeyStoreError::KeyExists(key_ref.to_string()),
        _ => KeyStoreError::Io(e),
    })?;
    file.write_all(private_pem.as_bytes())?;
    file.sync_all()?;

    fs::write(dir.join(format!("{}{}", key_ref, PUBLIC_KEY_SUFFIX)), public_pem)?;
    Ok(())
}
