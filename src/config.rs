//! Configuration file support.
//!
//! Settings are stored as versioned JSON, either at an explicit path or at
//! the per-user default location.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compositor::CompositeOptions;
use crate::constants::{DEFAULT_ALPHA, DEFAULT_BLINK_POLL_MS, DEFAULT_COLOR_SEED, DEFAULT_THRESHOLD};

/// Log level setting for the application.
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
    /// Get all log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

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

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub segmentation: SegmentationConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub blink: BlinkConfig,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Region production settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Luminance at or above which a pixel is foreground
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Seed for region display colors
    #[serde(default = "default_color_seed")]
    pub color_seed: u64,

    /// Mask stack (`.npy`) for the model-based producer
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

fn default_threshold() -> u8 {
    DEFAULT_THRESHOLD
}

fn default_color_seed() -> u64 {
    DEFAULT_COLOR_SEED
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            color_seed: default_color_seed(),
            model_path: None,
        }
    }
}

/// Compositing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Overlay weight, in `[0, 1]`
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

fn default_alpha() -> f32 {
    DEFAULT_ALPHA
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
        }
    }
}

/// Blink synchronizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkConfig {
    /// Cancellation poll while waiting for the next event
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_BLINK_POLL_MS
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            segmentation: SegmentationConfig::default(),
            render: RenderConfig::default(),
            blink: BlinkConfig::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let alpha = self.render.alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(ConfigError::InvalidValue {
                field: "render.alpha",
                message: format!("{} is outside [0, 1]", alpha),
            });
        }
        if self.blink.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "blink.poll_interval_ms",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Compositing options for these settings.
    pub fn composite_options(&self) -> CompositeOptions {
        CompositeOptions::with_alpha(self.render.alpha)
    }

    /// Blink cancellation poll interval.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.blink.poll_interval_ms)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "maskselect-config.json"
    }

    /// Load and validate configuration from `path`.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("maskselect").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("maskselect")
                    .join(Self::default_filename())
            })
        }
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

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
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

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
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
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
