//! Configuration sections

use serde::{Deserialize, Serialize};
use bpi_types::{ColorChoice, OutputFormat};
use std::path::PathBuf;

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub default_output: OutputFormat,
    #[serde(default)]
    pub color: ColorChoice,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub db_path: Option<PathBuf>,
    pub blobstore_path: Option<PathBuf>,
}

/// Per-job settings, keyed by job name in the TOML file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobsConfig {
    #[serde(default)]
    pub buildpack_installer: JobConfig,
}

/// Settings consumed by the job layer for one job kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

// The installer performs no retries of its own
fn default_max_attempts() -> u32 {
    1
}
