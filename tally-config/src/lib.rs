//! Configuration loading and typed settings for Tally components.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Top-level settings. Every field has a default so a missing config file
/// still yields a working setup.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tally.db"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Loads settings from an optional TOML file, then layers `TALLY_*`
/// environment overrides on top (e.g. `TALLY_DATABASE__PATH`).
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let mut builder = Config::builder();
    builder = match path {
        Some(path) => builder.add_source(File::from(path.to_path_buf())),
        None => builder.add_source(File::with_name("tally").required(false)),
    };
    let config = builder
        .add_source(Environment::with_prefix("TALLY").separator("__"))
        .build()
        .context("failed to load configuration")?;
    config
        .try_deserialize()
        .context("invalid configuration values")
}
