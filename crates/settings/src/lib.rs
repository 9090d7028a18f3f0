//! Merkledrop Settings
//!
//! JSON config persistence and atomic artifact writes. The config side is
//! a generic `Settings<T>` wrapper over any serializable config type; the
//! artifact side writes whole documents via a temp file and rename so a
//! failed run never leaves a partial file behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(String),
    #[error("Failed to write settings: {0}")]
    WriteError(String),
    #[error("Failed to parse settings: {0}")]
    ParseError(String),
    #[error("Failed to create directory: {0}")]
    CreateDirError(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Generic settings wrapper for any serializable config type.
///
/// ```ignore
/// let settings: Settings<DistributionConfig> =
///     Settings::load_or_default("merkledrop", None)?;
/// ```
pub struct Settings<T> {
    pub config: T,
    path: PathBuf,
}

impl<T: Serialize + DeserializeOwned + Default> Settings<T> {
    /// Load settings from the default path for a service, or create and
    /// persist defaults if no file exists yet.
    pub fn load_or_default(service: &str, custom_path: Option<&Path>) -> Result<Self> {
        let path = match custom_path {
            Some(p) => p.to_path_buf(),
            None => default_settings_path(service),
        };

        if path.exists() {
            debug!("Loading settings from {}", path.display());
            let content = fs::read_to_string(&path)
                .map_err(|e| SettingsError::ReadError(e.to_string()))?;
            let config: T = serde_json::from_str(&content)
                .map_err(|e| SettingsError::ParseError(e.to_string()))?;
            Ok(Self { config, path })
        } else {
            debug!("Creating default settings at {}", path.display());
            let settings = Self {
                config: T::default(),
                path,
            };
            settings.save()?;
            Ok(settings)
        }
    }

    /// Save current settings to disk (atomically).
    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.config)
    }

    /// Get the path where settings are stored.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialize a value to pretty JSON and write it atomically: the content
/// goes to a sibling temp file which is renamed over the target, so
/// readers never observe a half-written document.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| SettingsError::CreateDirError(e.to_string()))?;
        }
    }
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| SettingsError::WriteError(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(|e| SettingsError::WriteError(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| SettingsError::WriteError(e.to_string()))
}

/// Default settings file path for a service: the platform config dir,
/// falling back to the current directory when no home is available.
pub fn default_settings_path(service: &str) -> PathBuf {
    config_dir_for(service).join("settings.json")
}

fn config_dir_for(service: &str) -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|_| PathBuf::from("."));
    base.join(service.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
    struct TestConfig {
        name: String,
        value: u32,
    }

    #[test]
    fn test_settings_load_or_default() {
        let dir = std::env::temp_dir().join("merkledrop-settings-test");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("test-settings.json");

        // Create default
        let settings: Settings<TestConfig> =
            Settings::load_or_default("test", Some(&path)).unwrap();
        assert_eq!(settings.config, TestConfig::default());

        // Load existing
        let settings2: Settings<TestConfig> =
            Settings::load_or_default("test", Some(&path)).unwrap();
        assert_eq!(settings2.config, TestConfig::default());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = std::env::temp_dir().join("merkledrop-settings-test-save");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut settings: Settings<TestConfig> =
            Settings::load_or_default("test", Some(&path)).unwrap();
        settings.config.name = "modified".to_string();
        settings.config.value = 42;
        settings.save().unwrap();

        let loaded: Settings<TestConfig> =
            Settings::load_or_default("test", Some(&path)).unwrap();
        assert_eq!(loaded.config.name, "modified");
        assert_eq!(loaded.config.value, 42);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_write_json_atomic_leaves_no_temp_file() {
        let dir = std::env::temp_dir().join("merkledrop-settings-test-atomic");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("artifact.json");

        write_json_atomic(&path, &TestConfig { name: "x".into(), value: 7 }).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded: TestConfig =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.value, 7);

        let _ = fs::remove_dir_all(&dir);
    }
}
