//! Protocol buffer messages for `export.bin` and `export.sig`.
//!
//! Field numbers and types match the `export.proto` schema shipped to
//! clients. Every scalar is a proto2 `optional`, so an unset field is absent
//! from the encoding rather than written as zero.

/// Contents of `export.bin` after the fixed header.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TemporaryExposureKeyExport {
    /// Start of the batch window, epoch seconds (UTC).
    #[prost(fixed64, optional, tag = "1")]
    pub start_timestamp: Option<u64>,

    /// End of the batch window, epoch seconds (UTC).
    #[prost(fixed64, optional, tag = "2")]
    pub end_timestamp: Option<u64>,

    /// Region the keys were collected for.
    #[prost(string, optional, tag = "3")]
    pub region: Option<String>,

    /// 1-based position of this file within the export.
    #[prost(int32, optional, tag = "4")]
    pub batch_num: Option<i32>,

    /// Number of files in the export.
    #[prost(int32, optional, tag = "5")]
    pub batch_size: Option<i32>,

    /// Signers that produced entries in the matching `export.sig`.
    #[prost(message, repeated, tag = "6")]
    pub signature_infos: Vec<SignatureInfo>,

    /// Diagnosis keys, sorted by key data.
    #[prost(message, repeated, tag = "7")]
    pub keys: Vec<TemporaryExposureKey>,
}

/// Identity of a signer and the algorithm it uses.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct SignatureInfo {
    #[prost(string, optional, tag = "1")]
    pub app_bundle_id: Option<String>,

    #[prost(string, optional, tag = "2")]
    pub android_package: Option<String>,

    #[prost(string, optional, tag = "3")]
    pub verification_key_version: Option<String>,

    #[prost(string, optional, tag = "4")]
    pub verification_key_id: Option<String>,

    /// Always [`crate::SIGNATURE_ALGORITHM`] for files we produce.
    #[prost(string, optional, tag = "5")]
    pub signature_algorithm: Option<String>,
}

/// A single diagnosis key.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct TemporaryExposureKey {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub key_data: Option<Vec<u8>>,

    #[prost(int32, optional, tag = "2")]
    pub transmission_risk_level: Option<i32>,

    #[prost(int32, optional, tag = "3")]
    pub rolling_start_interval_number: Option<i32>,

    #[prost(int32, optional, tag = "4", default = "144")]
    pub rolling_period: Option<i32>,
}

/// Contents of `export.sig`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TekSignatureList {
    #[prost(message, repeated, tag = "1")]
    pub signatures: Vec<TekSignature>,
}

/// One signer's signature over `export.bin`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TekSignature {
    #[prost(message, optional, tag = "1")]
    pub signature_info: Option<SignatureInfo>,

    #[prost(int32, optional, tag = "2")]
    pub batch_num: Option<i32>,

    #[prost(int32, optional, tag = "3")]
    pub batch_size: Option<i32>,

    /// DER-encoded ECDSA signature.
    #[prost(bytes = "vec", optional, tag = "4")]
    pub signature: Option<Vec<u8>>,
}
