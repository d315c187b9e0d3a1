//! Log output for the `ek-export` binary
//!
//! The library only emits `tracing` events; this module installs the
//! subscriber. Logs go to stderr so stdout stays free for command output.
//! `RUST_LOG`, when set, overrides the configured level.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

/// Log level
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human readable
    #[default]
    Compact,
    /// Multi-line for development
    Pretty,
    /// One JSON object per event
    Json,
}

/// `[logging]` table of the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Filter directive for this crate and the wire crate.
    pub fn filter_directive(&self) -> String {
        format!("ek_export={level},ek_proto={level}", level = self.level)
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter_directive())?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Compact => registry
            .with(fmt_layer::layer().compact().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt_layer::layer().pretty().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt_layer::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}
