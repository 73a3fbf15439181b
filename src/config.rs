//! Configuration file support.
//!
//! Settings live in a small JSON file. Every field has a default, so an empty
//! object is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HANDLE_RADIUS, DEFAULT_MIN_BOX_SIZE};

/// Log level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Boxes narrower or shorter than this (in canvas units) are discarded
    /// when drawing ends
    pub min_box_size: f32,

    /// Half-size of the square hit area around each resize handle, in pixels
    pub handle_radius: u32,

    /// Root directory for the file backend
    pub data_dir: Option<PathBuf>,

    /// Auto-save timing
    pub auto_save: AutoSaveConfig,

    /// Log verbosity level
    pub log_level: LogLevel,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            min_box_size: DEFAULT_MIN_BOX_SIZE,
            handle_radius: DEFAULT_HANDLE_RADIUS,
            data_dir: None,
            auto_save: AutoSaveConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// Auto-save section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    pub enabled: bool,
    /// Quiet period after the last edit before saving
    pub debounce_secs: u64,
    /// Minimum time between two saves
    pub interval_secs: u64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_secs: 3,
            interval_secs: 30,
        }
    }
}

impl SessionConfig {
    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        if config.min_box_size.is_nan() || config.min_box_size < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "min_box_size must be a non-negative number, got {}",
                config.min_box_size
            )));
        }

        Ok(config)
    }

    /// Get the default config filename.
    pub fn default_filename() -> &'static str {
        "satcore-config.json"
    }

    /// Get the default config file path.
    /// Returns None on WASM (no filesystem access).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        let base = dirs::config_dir().or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(base.join("satcore").join(Self::default_filename()))
    }

    /// Directory sessions are stored under when none is configured.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("satcore"))
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A field holds a value outside its allowed range
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
