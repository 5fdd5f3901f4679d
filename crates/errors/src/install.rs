//! Buildpack install error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum InstallError {
    /// The same (name, stack) pair was already planned in this batch.
    #[error("buildpack {name} is already planned for stack {}", stack.as_deref().unwrap_or("<none>"))]
    DuplicateInstall { name: String, stack: Option<String> },

    /// A stackless artifact cannot replace a buildpack bound to a stack.
    #[error("existing buildpack {name} (stack {stack}) must be upgraded with a buildpack that has a stack")]
    StacklessIncompatible { name: String, stack: String },

    #[error("unable to determine buildpack to update: {count} buildpacks named {name} match")]
    AmbiguousTarget { name: String, count: usize },

    #[error("uploaded buildpack stack ({uploaded}) does not match {existing}")]
    StackMismatch { existing: String, uploaded: String },

    #[error("buildpack {name} already exists for stack {stack}")]
    StackConflict { name: String, stack: String },

    #[error("artifact upload failed for {name}: {message}")]
    UploadFailed { name: String, message: String },

    #[error("artifact not found: {path}")]
    ArtifactNotFound { path: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::DuplicateInstall { .. } => {
                Some("Remove the repeated buildpack entry from the install batch.")
            }
            Self::StacklessIncompatible { .. } | Self::StackMismatch { .. } => {
                Some("Upload an artifact whose manifest.yml declares the buildpack's stack.")
            }
            Self::AmbiguousTarget { .. } => {
                Some("Delete or rename the conflicting buildpacks so only one matches.")
            }
            Self::StackConflict { .. } => {
                Some("Update the existing buildpack for that stack instead.")
            }
            Self::UploadFailed { .. } => Some("Check the blobstore and retry the install."),
            Self::ArtifactNotFound { .. } => Some("Verify the artifact path and retry."),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::UploadFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DuplicateInstall { .. } => "install.duplicate",
            Self::StacklessIncompatible { .. } => "install.stackless_incompatible",
            Self::AmbiguousTarget { .. } => "install.ambiguous_target",
            Self::StackMismatch { .. } => "install.stack_mismatch",
            Self::StackConflict { .. } => "install.stack_conflict",
            Self::UploadFailed { .. } => "install.upload_failed",
            Self::ArtifactNotFound { .. } => "install.artifact_not_found",
        };
        Some(code)
    }
}
