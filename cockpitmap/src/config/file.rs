//! Loading and saving the configuration file.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::feed::FeedConfig;
use crate::follow::FollowConfig;
use crate::overlay::OverlayConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// JSON file holding the last known location.
    pub last_location: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            last_location: default_last_location_path(),
        }
    }
}

/// Everything read from `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub follow: FollowConfig,
    pub overlay: OverlayConfig,
    pub feed: FeedConfig,
    pub storage: StorageSettings,
}

impl ConfigFile {
    /// Load from `~/.cockpitmap/config.ini`.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(contents: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(contents).map_err(ini::Error::Parse)?;
        super::parser::parse_ini(&ini)
    }

    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write the configuration, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }
        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Render as INI text.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }
}

/// `~/.cockpitmap`
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cockpitmap")
}

/// `~/.cockpitmap/config.ini`
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// `~/.cockpitmap/last_location.json`
pub fn default_last_location_path() -> PathBuf {
    config_directory().join("last_location.json")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_paths() {
        assert!(config_directory().ends_with(".cockpitmap"));
        assert!(config_file_path().ends_with(".cockpitmap/config.ini"));
        assert!(default_last_location_path().ends_with("last_location.json"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("config.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.follow.resume_delay, Duration::from_secs(5));
        assert_eq!(config.overlay.route_padding_px, 120);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub/config.ini");

        let mut config = ConfigFile::default();
        config.follow.resume_delay = Duration::from_millis(3_000);
        config.follow.nav_tilt = 30.0;
        config.overlay.marker_hit_radius_m = 50.0;
        config.feed.track_window = 6;
        config.storage.last_location = dir.path().join("loc.json");

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
