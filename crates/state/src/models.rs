//! Database models for buildpack state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored buildpack record
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Buildpack {
    pub id: i64,
    pub guid: String,
    pub name: String,
    /// `None` means the buildpack is stack-agnostic
    pub stack: Option<String>,
    pub position: i64,
    pub enabled: bool,
    pub locked: bool,
    pub filename: Option<String>,
    pub artifact_key: Option<String>,
    pub checksum: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Buildpack {
    /// Whether an artifact has been attached yet
    #[must_use]
    pub fn has_artifact(&self) -> bool {
        self.artifact_key.is_some()
    }

    /// Same stored row, regardless of attribute drift since it was read
    #[must_use]
    pub fn same_row(&self, other: &Buildpack) -> bool {
        self.guid == other.guid
    }

    #[must_use]
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.updated_at, 0)
    }
}

/// Columns written when an artifact is attached to a buildpack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUpdate {
    pub artifact_key: String,
    pub filename: String,
    pub checksum: String,
    pub stack: Option<String>,
}
