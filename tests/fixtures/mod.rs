//! Shared inputs for export integration tests
//!
//! The reference scenario is one batch for region AT on 2023-01-01, two
//! keys given out of order, and a single Android signer.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use ek_export::{BatchDescriptor, ExposureRecord, KeyStore, SignerConfig};

/// Batch window 2023-01-01T00:00Z .. 2023-01-02T00:00Z, region AT
pub fn scenario_batch() -> BatchDescriptor {
    BatchDescriptor::new(
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap(),
        "AT",
    )
}

/// `K2` with rolling fields, then `K1` without
pub fn scenario_exposures() -> Vec<ExposureRecord> {
    vec![
        ExposureRecord::new("K2", 5).with_rolling(2660, 144),
        ExposureRecord::new("K1", 3),
    ]
}

pub fn scenario_signer() -> SignerConfig {
    SignerConfig::new("sig1")
        .with_android_package("org.example.app")
        .with_key_version("v1")
        .with_key_id("sig1")
}

/// Registry holding freshly generated keys for each reference
pub fn key_store(key_refs: &[&str]) -> KeyStore {
    let mut store = KeyStore::new();
    for key_ref in key_refs {
        store.generate(*key_ref).unwrap();
    }
    store
}

/// 16 bytes of key material derived from `seed`
pub fn tek(seed: u8) -> Vec<u8> {
    (0..16u8).map(|i| seed.wrapping_mul(31).wrapping_add(i)).collect()
}
