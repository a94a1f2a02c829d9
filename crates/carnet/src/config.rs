//! Configuration management for carnet.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "carnet";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "carnet.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CARNET_`, `__` between sections)
/// 2. TOML config file at `~/.config/carnet/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Backup and PDF output configuration.
    pub export: ExportConfig,
    /// PDF rendering configuration.
    pub pdf: PdfConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/carnet/carnet.db`
    pub database_path: Option<PathBuf>,
}

/// Output-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving backups and PDFs.
    /// Defaults to the user's download directory.
    pub output_dir: Option<PathBuf>,
}

/// PDF rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Pause after switching pages, before the snapshot, in milliseconds.
    pub settle_delay_ms: u64,
    /// Raster resolution.
    pub dpi: u32,
    /// JPEG quality of page images, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100,
            dpi: 96,
            jpeg_quality: 60,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CARNET_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.pdf.dpi == 0 {
            return Err(Error::ConfigValidation {
                message: "dpi must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.pdf.jpeg_quality) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "jpeg_quality ({}) must be between 1 and 100",
                    self.pdf.jpeg_quality
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the output directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the settle delay as a Duration.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.pdf.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert!(config.export.output_dir.is_none());
    }

    #[test]
    fn test_default_pdf_config() {
        let pdf = PdfConfig::default();

        assert_eq!(pdf.settle_delay_ms, 100);
        assert_eq!(pdf.dpi, 96);
        assert_eq!(pdf.jpeg_quality, 60);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_dpi() {
        let mut config = Config::default();
        config.pdf.dpi = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("dpi"));
    }

    #[test]
    fn test_validate_jpeg_quality() {
        let mut config = Config::default();
        config.pdf.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.pdf.jpeg_quality = 101;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("jpeg_quality (101)"));

        config.pdf.jpeg_quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.ends_with("carnet/carnet.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_output_dir_custom() {
        let mut config = Config::default();
        config.export.output_dir = Some(PathBuf::from("/tmp/rapports"));
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/rapports"));
    }

    #[test]
    fn test_settle_delay() {
        let config = Config::default();
        assert_eq!(config.settle_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.ends_with("carnet/config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[pdf]\ndpi = 150\n\n[export]\noutput_dir = \"/srv/carnets\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.pdf.dpi, 150);
        assert_eq!(config.pdf.jpeg_quality, 60);
        assert_eq!(config.output_dir(), PathBuf::from("/srv/carnets"));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pdf]\njpeg_quality = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_pdf_config_deserialize() {
        let json = r#"{"settle_delay_ms": 0, "dpi": 72}"#;
        let pdf: PdfConfig = serde_json::from_str(json).unwrap();
        assert_eq!(pdf.settle_delay_ms, 0);
        assert_eq!(pdf.dpi, 72);
        assert_eq!(pdf.jpeg_quality, 60);
    }
}
