//! Export configuration
//!
//! Parses `ek-export.toml`: the signers to include in every export, where
//! their private keys live, and logging settings. Private keys are never
//! part of the config itself, only the directory they are loaded from.

mod defaults;

pub use defaults::{DEFAULT_CONFIG_PATH, SCHEMA_VERSION};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;
use crate::model::SignerConfig;

/// Errors from loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported schema_version {0}")]
    UnsupportedSchema(u32),

    #[error("No signers configured")]
    NoSigners,

    #[error("Signer #{index}: key_ref must not be empty")]
    EmptyKeyRef { index: usize },

    #[error("Duplicate signer key_ref: '{0}'")]
    DuplicateKeyRef(String),
}

/// Contents of `ek-export.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "defaults::schema_version")]
    pub schema_version: u32,

    /// Directory holding `<key_ref>.pem` private keys. Relative paths are
    /// resolved against the config file's directory.
    #[serde(default = "defaults::key_dir")]
    pub key_dir: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Signers, in the order their entries appear in exports
    #[serde(default, rename = "signer")]
    pub signers: Vec<SignerConfig>,

    /// Directory of the file this config was loaded from
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl ExportConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExportConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema(self.schema_version));
        }
        if self.signers.is_empty() {
            return Err(ConfigError::NoSigners);
        }

        let mut seen = HashSet::new();
        for (index, signer) in self.signers.iter().enumerate() {
            if signer.key_ref.is_empty() {
                return Err(ConfigError::EmptyKeyRef { index });
            }
            if !seen.insert(&signer.key_ref) {
                return Err(ConfigError::DuplicateKeyRef(signer.key_ref.clone()));
            }
        }
        Ok(())
    }

    /// Key directory with relative paths resolved against the config file.
    pub fn key_dir_path(&self) -> PathBuf {
        let dir = PathBuf::from(&self.key_dir);
        match &self.base_dir {
            Some(base) if dir.is_relative() => base.join(dir),
            _ => dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogLevel};

    const SAMPLE: &str = r#"
key_dir = "/etc/ek-export/keys"

[logging]
level = "debug"
format = "json"

[[signer]]
key_ref = "sig1"
android_package = "org.example.app"
key_version = "v1"
key_id = "sig1"

[[signer]]
key_ref = "sig2"
app_bundle_id = "org.example.ios"
"#;

    #[test]
    fn test_parse_full() {
        let config = ExportConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.signers.len(), 2);
        assert_eq!(
            config.signers[0].android_package.as_deref(),
            Some("org.example.app")
        );
        assert_eq!(config.signers[1].key_id, None);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.key_dir_path(), PathBuf::from("/etc/ek-export/keys"));
    }

    #[test]
    fn test_defaults() {
        let config = ExportConfig::parse("[[signer]]\nkey_ref = \"a\"\n").unwrap();
        assert_eq!(config.key_dir, "keys");
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.key_dir_path(), PathBuf::from("keys"));
    }

    #[test]
    fn test_no_signers() {
        assert!(matches!(
            ExportConfig::parse("key_dir = \"k\"\n"),
            Err(ConfigError::NoSigners)
        ));
    }

    #[test]
    fn test_duplicate_key_ref() {
        let toml = "[[signer]]\nkey_ref = \"a\"\n[[signer]]\nkey_ref = \"a\"\n";
        assert!(matches!(
            ExportConfig::parse(toml),
            Err(ConfigError::DuplicateKeyRef(ref r)) if r == "a"
        ));
    }

    #[test]
    fn test_empty_key_ref() {
        assert!(matches!(
            ExportConfig::parse("[[signer]]\nkey_ref = \"\"\n"),
            Err(ConfigError::EmptyKeyRef { index: 0 })
        ));
    }

    #[test]
    fn test_unsupported_schema() {
        let toml = "schema_version = 7\n[[signer]]\nkey_ref = \"a\"\n";
        assert!(matches!(
            ExportConfig::parse(toml),
            Err(ConfigError::UnsupportedSchema(7))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ExportConfig::parse("[[signer]\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_resolves_relative_key_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ek-export.toml");
        std::fs::write(&path, "[[signer]]\nkey_ref = \"a\"\n").unwrap();

        let config = ExportConfig::load(&path).unwrap();
        assert_eq!(config.key_dir_path(), dir.path().join("keys"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            ExportConfig::load(&dir.path().join("absent.toml")),
            Err(ConfigError::NotFound(_))
        ));
    }
}
