//! Configuration for glycorisk.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the default model artifact.
pub const MODEL_FILE_NAME: &str = "diabetes_risk_model.json";

/// File name of the default scaler artifact.
pub const SCALER_FILE_NAME: &str = "scaler.json";

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the gradient-boosted model artifact
    pub model_path: PathBuf,

    /// Path to the fitted scaler artifact
    pub scaler_path: PathBuf,

    /// Directory for FHIR exports
    pub export_path: PathBuf,

    /// Path for storing the transparency log
    pub data_path: PathBuf,

    /// IANA time zone used for export timestamps
    pub timezone: String,

    /// Write an export after every assessment without asking
    pub auto_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("glycorisk");

        Self {
            model_path: data_dir.join("artifacts").join(MODEL_FILE_NAME),
            scaler_path: data_dir.join("artifacts").join(SCALER_FILE_NAME),
            export_path: data_dir.join("exports"),
            data_path: data_dir,
            timezone: "UTC".to_string(),
            auto_export: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("glycorisk")
            .join("config.json")
    }

    /// Ensure export and data directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Parse the configured time zone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Path of the persisted transparency log.
    pub fn transparency_log_path(&self) -> PathBuf {
        self.data_path.join("transparency.json")
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidTimezone(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidTimezone(tz) => write!(f, "Unknown time zone '{tz}'"),
        }
    }
}

impl std::error::Error for ConfigError {}
