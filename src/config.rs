//! Application configuration loaded from `config.toml`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::logging::LoggingConfig;
use crate::volume_profile::{VolumeProfileConfig, VolumeProfileError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Validation error: {0}")]
    Validation(#[from] VolumeProfileError),
}

/// Logging section of config.toml
#[derive(Debug, Clone, Default, Deserialize)]
struct LoggingTomlConfig {
    pub level_filter: Option<String>,
    pub json_format: Option<bool>,
    pub timestamps: Option<bool>,
}

/// Full TOML configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    pub volume_profile: Option<VolumeProfileConfig>,
    pub logging: Option<LoggingTomlConfig>,
}

/// Application configuration (converted from TOML)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub volume_profile: VolumeProfileConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&config_content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlConfig = toml::from_str(content)?;
        let config = Self::from_toml_config(toml_config);
        config.volume_profile.validate()?;
        Ok(config)
    }

    fn from_toml_config(toml_config: TomlConfig) -> Self {
        let defaults = LoggingConfig::default();
        let logging = match toml_config.logging {
            Some(log_config) => LoggingConfig {
                level_filter: log_config.level_filter.unwrap_or(defaults.level_filter),
                json_format: log_config.json_format.unwrap_or(defaults.json_format),
                timestamps: log_config.timestamps.unwrap_or(defaults.timestamps),
            },
            None => defaults,
        };

        Self {
            volume_profile: toml_config.volume_profile.unwrap_or_default(),
            logging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_full_config() {
        let content = r#"
            [volume_profile]
            num_bins = 30
            value_area_fraction = 0.68
            hvn_threshold = 2.0
            lvn_threshold = 0.25
            parallel_threshold = 1000

            [volume_profile.asset_overrides.BTCUSDT]
            num_bins = 50

            [logging]
            level_filter = "debug"
            json_format = true
        "#;

        let config = AppConfig::from_toml_str(content).unwrap();
        let vp = &config.volume_profile;
        assert_eq!(vp.num_bins, 30);
        assert_eq!(vp.value_area_fraction, 0.68);
        assert_eq!(vp.hvn_threshold, 2.0);
        assert_eq!(vp.lvn_threshold, 0.25);
        assert_eq!(vp.parallel_threshold, 1000);
        assert_eq!(vp.resolve_for_asset("BTCUSDT").num_bins, 50);
        assert_eq!(vp.resolve_for_asset("BTCUSDT").value_area_fraction, 0.68);

        assert_eq!(config.logging.level_filter, "debug");
        assert!(config.logging.json_format);
        assert!(config.logging.timestamps);
    }

    #[test]
    fn test_partial_volume_profile_section() {
        let config = AppConfig::from_toml_str("[volume_profile]\nnum_bins = 12\n").unwrap();
        assert_eq!(config.volume_profile.num_bins, 12);
        assert_eq!(config.volume_profile.value_area_fraction, 0.70);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str("[volume_profile]\nnum_bins = 0\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[volume_profile]\nvalue_area_fraction = 1.5\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[volume_profile]\nnum_bins = -3\n"),
            Err(ConfigError::Toml(_))
        ));
    }
}
