use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "ShippingFeeEstimator";
const APP_NAME: &str = "ShippingFeeEstimator";
const DATA_DIR_NAME: &str = "shipping-fee-estimator";
const LOCAL_RATES_FILENAME: &str = "rates.json";

pub const ENV_RATES: &str = "SHIPFEE_RATES";
pub const ENV_PHONETIC: &str = "SHIPFEE_PHONETIC";

/// User settings, stored as `config.json` in the platform config directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rate sheet to load instead of the bundled one.
    #[serde(default)]
    pub rates_path: Option<PathBuf>,
    /// Pinyin initials table to load instead of the bundled one.
    #[serde(default)]
    pub phonetic_path: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_filter: Option<String>,
}

/// Where the active rate sheet comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RatesSource {
    File(PathBuf),
    Embedded,
}

impl AppConfig {
    /// Applies `SHIPFEE_RATES` / `SHIPFEE_PHONETIC` from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_RATES).filter(|value| !value.trim().is_empty()) {
            self.rates_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(ENV_PHONETIC).filter(|value| !value.trim().is_empty()) {
            self.phonetic_path = Some(PathBuf::from(path));
        }
        self
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Configured path, then `rates.json` in the local data dir, then the
    /// bundled sheet.
    pub fn rates_source(&self) -> RatesSource {
        self.rates_source_with(local_rates_path())
    }

    fn rates_source_with(&self, local: Option<PathBuf>) -> RatesSource {
        if let Some(path) = &self.rates_path {
            return RatesSource::File(path.clone());
        }
        match local {
            Some(path) if path.is_file() => RatesSource::File(path),
            _ => RatesSource::Embedded,
        }
    }
}

fn config_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("config.json"))
}

/// Drop-in rate sheet location under the user's local data directory.
pub fn local_rates_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|base| base.join(DATA_DIR_NAME).join(LOCAL_RATES_FILENAME))
}

/// Loads the user config. A missing file yields the defaults.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file().ok_or(ConfigError::StorageUnavailable)?;
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(data) => Ok(serde_json::from_str(&data)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(err) => Err(err.into()),
    }
}

pub fn save_config(config: &AppConfig) -> Result<PathBuf, ConfigError> {
    let path = config_file().ok_or(ConfigError::StorageUnavailable)?;
    save_config_to(&path, config)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}
