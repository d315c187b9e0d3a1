//! Built-in defaults for `ek-export.toml`.

/// Config file looked up when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "ek-export.toml";

/// Current config schema version.
pub const SCHEMA_VERSION: u32 = 1;

pub(crate) fn schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Key directory, relative to the config file.
pub(crate) fn key_dir() -> String {
    "keys".to_string()
}
