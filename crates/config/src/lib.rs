#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for bpi
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/bpi/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod core;

pub use crate::core::{GeneralConfig, JobConfig, JobsConfig, PathConfig};

use bpi_errors::{ConfigError, Error};
use bpi_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub jobs: JobsConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the contents are not valid TOML for [`Config`].
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(output) = lookup(constants::ENV_OUTPUT) {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => return Err(invalid(constants::ENV_OUTPUT, output)),
            };
        }

        if let Some(color) = lookup(constants::ENV_COLOR) {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => return Err(invalid(constants::ENV_COLOR, color)),
            };
        }

        if let Some(path) = lookup(constants::ENV_DB_PATH) {
            if path.is_empty() {
                return Err(invalid(constants::ENV_DB_PATH, path));
            }
            self.paths.db_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup(constants::ENV_BLOBSTORE_PATH) {
            if path.is_empty() {
                return Err(invalid(constants::ENV_BLOBSTORE_PATH, path));
            }
            self.paths.blobstore_path = Some(PathBuf::from(path));
        }

        if let Some(attempts) = lookup(constants::ENV_INSTALLER_MAX_ATTEMPTS) {
            let parsed: u32 = attempts
                .parse()
                .map_err(|_| invalid(constants::ENV_INSTALLER_MAX_ATTEMPTS, attempts.clone()))?;
            if parsed == 0 {
                return Err(invalid(constants::ENV_INSTALLER_MAX_ATTEMPTS, attempts));
            }
            self.jobs.buildpack_installer.max_attempts = parsed;
        }

        Ok(())
    }

    /// Get the database path (with default)
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.paths
            .db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_DB_PATH))
    }

    /// Get the blobstore root (with default)
    #[must_use]
    pub fn blobstore_path(&self) -> PathBuf {
        self.paths
            .blobstore_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_BLOBSTORE_PATH))
    }
}

fn invalid(field: &str, value: String) -> Error {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value,
    }
    .into()
}
