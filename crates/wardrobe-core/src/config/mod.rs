//! Configuration management for Wardrobe.
//!
//! Configuration is loaded from a TOML file in the platform config directory
//! with sensible defaults. Endpoints themselves live in the endpoint store,
//! not here.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Wardrobe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Endpoint store settings
    pub store: StoreConfig,

    /// Background removal settings
    pub background: BackgroundConfig,

    /// Vision request settings
    pub vision: VisionConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.wardrobe.wardrobe/config.toml
    /// - Linux: ~/.config/wardrobe/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\wardrobe\config\config.toml
    ///
    /// Falls back to ~/.wardrobe/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "wardrobe", "wardrobe")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".wardrobe").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved endpoint store path (with ~ expansion).
    pub fn store_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.store.path);
        PathBuf::from(expanded.into_owned())
    }

    /// Path of the local segmentation model.
    pub fn segmentation_model_path(&self) -> PathBuf {
        self.model_dir()
            .join(&self.background.model)
            .join(format!("{}.onnx", self.background.model))
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
