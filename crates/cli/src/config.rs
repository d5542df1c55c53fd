//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use allocation_core::models::settings::{
    Settings, DEFAULT_TARGET, DEFAULT_TOLERANCE, DEFAULT_TOTAL_PATRIMONY,
};
use allocation_core::storage::session::DEFAULT_SESSION_KEY;
use log::info;
use serde::Deserialize;

use crate::error::{CliError, Result};

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub patrimony: PatrimonyConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllocationConfig {
    #[serde(default = "default_target")]
    pub target: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_target() -> f64 {
    DEFAULT_TARGET
}
fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            tolerance: default_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatrimonyConfig {
    #[serde(default = "default_total")]
    pub total: f64,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_total() -> f64 {
    DEFAULT_TOTAL_PATRIMONY
}
fn default_currency_symbol() -> String {
    "R$".into()
}

impl Default for PatrimonyConfig {
    fn default() -> Self {
        Self {
            total: default_total(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_dir")]
    pub dir: String,
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_dir() -> String {
    "./sessions".into()
}
fn default_key() -> String {
    DEFAULT_SESSION_KEY.into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            key: default_key(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CliError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Load config from a TOML file, falling back to defaults when the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("{} not found, using default configuration", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if !(self.allocation.target.is_finite() && self.allocation.target > 0.0) {
            return Err(CliError::Config("target must be > 0".into()));
        }
        if !(self.allocation.tolerance.is_finite() && self.allocation.tolerance >= 0.0) {
            return Err(CliError::Config("tolerance must be >= 0".into()));
        }
        if !(self.patrimony.total.is_finite() && self.patrimony.total >= 0.0) {
            return Err(CliError::Config("patrimony total must be >= 0".into()));
        }
        if self.storage.key.is_empty() {
            return Err(CliError::Config("storage key must not be empty".into()));
        }
        Ok(())
    }

    /// Library settings built from this config.
    pub fn settings(&self) -> Settings {
        Settings {
            target: self.allocation.target,
            tolerance: self.allocation.tolerance,
            total_patrimony: self.patrimony.total,
            currency_symbol: self.patrimony.currency_symbol.clone(),
        }
    }

    /// Directory of the session store.
    pub fn storage_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.dir)
    }
}
