//! ek-export CLI
//!
//! Entry point for the `ek-export` command-line tool.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use ek_export::archive::{write_archive, ExportArchive};
use ek_export::config::DEFAULT_CONFIG_PATH;
use ek_export::logging::{init_logging, LogLevel, LoggingConfig};
use ek_export::signing::{
    decode_public_key_pem, generate_signing_key, key_fingerprint, write_key_pair, KeyStore,
    KeyStoreError,
};
use ek_export::{
    produce_export_archive, verify_archive, BatchDescriptor, ExportConfig, ExposureKey,
    ExposureRecord, VerificationReport,
};
use ek_proto::{decode_signature_list, ExportFile};
use p256::ecdsa::VerifyingKey;
use serde_json::json;

#[derive(Parser)]
#[command(name = "ek-export")]
#[command(about = "Signed diagnosis key export archives", version)]
struct Cli {
    /// Log level (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and sign an export archive for one batch
    Build {
        /// Path to config file (default: ek-export.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// JSON file with the batch window and region
        #[arg(long)]
        batch: PathBuf,

        /// JSON file with the exposure records
        #[arg(long)]
        exposures: PathBuf,

        /// 1-based position of this file in the export
        #[arg(long, default_value_t = 1)]
        batch_num: u32,

        /// Number of files in the export
        #[arg(long, default_value_t = 1)]
        batch_size: u32,

        /// Output archive path
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// Verify the signatures in an export archive
    Verify {
        /// Archive to verify
        #[arg(long, short = 'a')]
        archive: PathBuf,

        /// Trusted public key as <key_id>=<pem path>; repeatable
        #[arg(long = "public-key", value_parser = parse_key_arg)]
        public_keys: Vec<(String, PathBuf)>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the contents of an export archive as JSON
    Inspect {
        /// Archive to inspect
        #[arg(long, short = 'a')]
        archive: PathBuf,
    },

    /// Generate a signing key pair
    Keygen {
        /// Directory to write <key_ref>.pem and <key_ref>.pub.pem into
        #[arg(long)]
        key_dir: PathBuf,

        /// Name of the key in the registry
        #[arg(long)]
        key_ref: String,
    },
}

fn parse_key_arg(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((key_id, path)) if !key_id.is_empty() && !path.is_empty() => {
            Ok((key_id.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected <key_id>=<pem path>, got '{}'", arg)),
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            batch,
            exposures,
            batch_num,
            batch_size,
            out,
        } => {
            run_build(
                config,
                cli.log_level,
                &batch,
                &exposures,
                batch_num,
                batch_size,
                &out,
            );
        }
        Commands::Verify {
            archive,
            public_keys,
            json,
        } => {
            setup_logging(LoggingConfig::default(), cli.log_level);
            run_verify(&archive, &public_keys, json);
        }
        Commands::Inspect { archive } => {
            setup_logging(LoggingConfig::default(), cli.log_level);
            run_inspect(&archive);
        }
        Commands::Keygen { key_dir, key_ref } => {
            setup_logging(LoggingConfig::default(), cli.log_level);
            run_keygen(&key_dir, &key_ref);
        }
    }
}

fn setup_logging(mut config: LoggingConfig, level: Option<LogLevel>) {
    if let Some(level) = level {
        config.level = level;
    }
    if let Err(e) = init_logging(&config) {
        eprintln!("Warning: could not initialize logging: {}", e);
    }
}

fn run_build(
    config_path: Option<PathBuf>,
    log_level: Option<LogLevel>,
    batch_path: &Path,
    exposures_path: &Path,
    batch_num: u32,
    batch_size: u32,
    out: &Path,
) {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = match ExportConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(2);
        }
    };
    setup_logging(config.logging.clone(), log_level);

    let key_dir = config.key_dir_path();
    let registry = match KeyStore::load_dir(&key_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error loading keys from {}: {}", key_dir.display(), e);
            process::exit(2);
        }
    };

    let batch: BatchDescriptor = read_json(batch_path);
    let exposures: Vec<ExposureRecord> = read_json(exposures_path);

    let archive = match produce_export_archive(
        &batch,
        &exposures,
        batch_num,
        batch_size,
        &config.signers,
        &registry,
    ) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Export failed ({}): {}", e.kind(), e);
            process::exit(1);
        }
    };

    if let Err(e) = write_archive(out, &archive) {
        eprintln!("Error writing {}: {}", out.display(), e);
        process::exit(1);
    }
    eprintln!(
        "Wrote: {} ({} keys, {} signers, {} bytes)",
        out.display(),
        exposures.len(),
        config.signers.len(),
        archive.len()
    );
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            process::exit(1);
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error parsing {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn run_verify(archive_path: &Path, public_keys: &[(String, PathBuf)], json_output: bool) {
    let mut trusted: BTreeMap<String, VerifyingKey> = BTreeMap::new();
    for (key_id, path) in public_keys {
        let key = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|pem| decode_public_key_pem(key_id, &pem).map_err(|e| e.to_string()));
        match key {
            Ok(key) => {
                trusted.insert(key_id.clone(), key);
            }
            Err(e) => {
                eprintln!("Error loading public key {}: {}", path.display(), e);
                process::exit(2);
            }
        }
    }

    let bytes = match fs::read(archive_path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error reading {}: {}", archive_path.display(), e);
            process::exit(1);
        }
    };

    let report = match verify_archive(&bytes, &trusted) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Verification failed: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        let output = json!({
            "archive": archive_path.display().to_string(),
            "verified": report.all_verified(),
            "signatures": report.checks,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_report(&report);
    }

    if !report.all_verified() {
        process::exit(1);
    }
}

fn print_report(report: &VerificationReport) {
    println!(
        "Region: {}  Batch: {}/{}  Keys: {}",
        report.export.region(),
        report.export.batch_num(),
        report.export.batch_size(),
        report.export.keys.len()
    );
    if report.checks.is_empty() {
        println!("  (no signatures)");
    }
    for check in &report.checks {
        let key_id = check.key_id.as_deref().unwrap_or("-");
        match &check.error {
            None => println!("  [ok]   {}", key_id),
            Some(reason) => println!("  [FAIL] {}: {}", key_id, reason),
        }
    }
}

fn run_inspect(archive_path: &Path) {
    let archive = match ExportArchive::from_file(archive_path) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error reading {}: {}", archive_path.display(), e);
            process::exit(1);
        }
    };
    let parsed = ExportFile::parse(&archive.export_bytes)
        .map_err(|e| e.to_string())
        .and_then(|file| {
            decode_signature_list(&archive.signature_bytes)
                .map(|sigs| (file.export, sigs))
                .map_err(|e| e.to_string())
        });
    let (export, signatures) = match parsed {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Malformed export: {}", e);
            process::exit(1);
        }
    };

    let timestamp = |seconds: Option<u64>| {
        seconds
            .and_then(|s| i64::try_from(s).ok())
            .and_then(|s| Utc.timestamp_opt(s, 0).single())
            .map(|t| t.to_rfc3339())
    };

    let keys: Vec<_> = export
        .keys
        .iter()
        .map(|k| {
            json!({
                "key": ExposureKey::new(k.key_data()).to_base64(),
                "transmission_risk_level": k.transmission_risk_level,
                "rolling_start_interval_number": k.rolling_start_interval_number,
                "rolling_period": k.rolling_period,
            })
        })
        .collect();
    let signature_infos: Vec<_> = export
        .signature_infos
        .iter()
        .map(|s| {
            json!({
                "verification_key_id": s.verification_key_id,
                "verification_key_version": s.verification_key_version,
                "android_package": s.android_package,
                "app_bundle_id": s.app_bundle_id,
                "signature_algorithm": s.signature_algorithm,
            })
        })
        .collect();

    let output = json!({
        "start": timestamp(export.start_timestamp),
        "end": timestamp(export.end_timestamp),
        "region": export.region,
        "batch_num": export.batch_num,
        "batch_size": export.batch_size,
        "keys": keys,
        "signature_infos": signature_infos,
        "signatures": signatures.signatures.len(),
    });

    match serde_json::to_string_pretty(&output) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_keygen(key_dir: &Path, key_ref: &str) {
    let key = generate_signing_key();
    match write_key_pair(key_dir, key_ref, &key) {
        Ok(()) => {}
        Err(KeyStoreError::KeyExists(_)) => {
            eprintln!("Key '{}' already exists in {}", key_ref, key_dir.display());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error writing key pair: {}", e);
            process::exit(1);
        }
    }

    println!("Key ref:     {}", key_ref);
    println!("Fingerprint: {}", key_fingerprint(key.verifying_key()));
    println!("Directory:   {}", key_dir.display());
}
