//! Inputs to an export call
//!
//! These are the shapes handed over by the batch source, the exposure key
//! store and the signer registry. They carry no behavior beyond small
//! accessors; the builder and signer impose ordering and encoding.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Usual length of temporary exposure key material.
pub const KEY_LENGTH: usize = 16;

/// Highest transmission risk level clients accept.
pub const MAX_TRANSMISSION_RISK: u8 = 8;

/// Time window and region of one export batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDescriptor {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub region: String,
}

impl BatchDescriptor {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, region: impl Into<String>) -> Self {
        Self {
            start,
            end,
            region: region.into(),
        }
    }
}

/// Opaque diagnosis key material.
///
/// Ordered by raw bytes. Serialized as standard base64, the form the key
/// store keeps it in. `Debug` never prints the material itself.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExposureKey(Vec<u8>);

impl ExposureKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a key from its base64 text form.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded).map(Self)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ExposureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExposureKey({} bytes)", self.0.len())
    }
}

impl From<&[u8]> for ExposureKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for ExposureKey {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl Serialize for ExposureKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for ExposureKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// One diagnosis key and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureRecord {
    pub key: ExposureKey,

    /// 0 to [`MAX_TRANSMISSION_RISK`]
    pub transmission_risk: u8,

    /// 10-minute interval number at which the key became active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_start_interval: Option<u32>,

    /// Number of intervals the key was valid for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_period: Option<u32>,
}

impl ExposureRecord {
    /// A record without rolling interval information.
    pub fn new(key: impl Into<ExposureKey>, transmission_risk: u8) -> Self {
        Self {
            key: key.into(),
            transmission_risk,
            rolling_start_interval: None,
            rolling_period: None,
        }
    }

    pub fn with_rolling(mut self, start_interval: u32, period: u32) -> Self {
        self.rolling_start_interval = Some(start_interval);
        self.rolling_period = Some(period);
        self
    }
}

/// Identity of one export signer.
///
/// `key_ref` names the private key in the signer registry; the key itself
/// never travels with the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerConfig {
    pub key_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_bundle_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

impl SignerConfig {
    pub fn new(key_ref: impl Into<String>) -> Self {
        Self {
            key_ref: key_ref.into(),
            android_package: None,
            app_bundle_id: None,
            key_version: None,
            key_id: None,
        }
    }

    pub fn with_android_package(mut self, package: impl Into<String>) -> Self {
        self.android_package = Some(package.into());
        self
    }

    pub fn with_app_bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.app_bundle_id = Some(bundle_id.into());
        self
    }

    pub fn with_key_version(mut self, version: impl Into<String>) -> Self {
        self.key_version = Some(version.into());
        self
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}
