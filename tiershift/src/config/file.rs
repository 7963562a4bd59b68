//! Settings file loading.

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::Settings;

/// Settings file errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl Settings {
    /// Load settings from the default path (~/.tiershift/config.ini).
    ///
    /// A missing file yields defaults.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&config_file_path())
    }

    /// Load settings from a specific path.
    ///
    /// A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }
}

/// The configuration directory (~/.tiershift).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tiershift")
}

/// The configuration file path (~/.tiershift/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
