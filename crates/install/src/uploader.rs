//! Attaching artifacts to buildpack rows

use async_trait::async_trait;
use bpi_errors::{Error, InstallError};
use bpi_stack::StackExtractor;
use bpi_state::{ArtifactUpdate, Buildpack, StateManager};
use bpi_store::{BlobStore, Checksum};
use bpi_types::display_stack;
use std::path::Path;
use std::sync::Arc;

/// Stores an artifact for a buildpack row
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    /// Upload `artifact` for `buildpack`, recording `filename` as its display name.
    ///
    /// Returns `false` when the stored artifact was already identical.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact conflicts with the row's stack or
    /// cannot be stored.
    async fn upload(
        &self,
        buildpack: &Buildpack,
        artifact: &Path,
        filename: &str,
    ) -> Result<bool, Error>;
}

/// Uploads into the filesystem blobstore and records the result on the row
#[derive(Clone)]
pub struct BlobstoreUploader {
    state: StateManager,
    blobstore: BlobStore,
    extractor: Arc<dyn StackExtractor>,
}

impl std::fmt::Debug for BlobstoreUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobstoreUploader")
            .field("blobstore", &self.blobstore)
            .finish_non_exhaustive()
    }
}

impl BlobstoreUploader {
    #[must_use]
    pub fn new(
        state: StateManager,
        blobstore: BlobStore,
        extractor: Arc<dyn StackExtractor>,
    ) -> Self {
        Self {
            state,
            blobstore,
            extractor,
        }
    }

    /// The stack the row will carry once this artifact is attached
    async fn resolve_stack(
        &self,
        buildpack: &Buildpack,
        detected: Option<String>,
    ) -> Result<Option<String>, Error> {
        match (&buildpack.stack, detected) {
            (Some(existing), detected) => {
                if detected.as_deref() == Some(existing.as_str()) {
                    Ok(Some(existing.clone()))
                } else {
                    Err(InstallError::StackMismatch {
                        existing: existing.clone(),
                        uploaded: display_stack(detected.as_deref()).to_string(),
                    }
                    .into())
                }
            }
            (None, Some(detected)) => {
                let holders = self
                    .state
                    .find_by_name_and_stack(&buildpack.name, &detected)
                    .await?;
                if holders.iter().any(|row| !row.same_row(buildpack)) {
                    return Err(InstallError::StackConflict {
                        name: buildpack.name.clone(),
                        stack: detected,
                    }
                    .into());
                }
                Ok(Some(detected))
            }
            (None, None) => Ok(None),
        }
    }
}

fn upload_failed(name: &str, err: &Error) -> Error {
    InstallError::UploadFailed {
        name: name.to_string(),
        message: err.to_string(),
    }
    .into()
}

#[async_trait]
impl ArtifactUploader for BlobstoreUploader {
    async fn upload(
        &self,
        buildpack: &Buildpack,
        artifact: &Path,
        filename: &str,
    ) -> Result<bool, Error> {
        if !tokio::fs::try_exists(artifact).await.unwrap_or(false) {
            return Err(InstallError::ArtifactNotFound {
                path: artifact.display().to_string(),
            }
            .into());
        }

        let checksum = Checksum::of_file(artifact)
            .await
            .map_err(|e| upload_failed(&buildpack.name, &e))?;
        let detected = self.extractor.extract(artifact).await;
        let stack = self.resolve_stack(buildpack, detected).await?;

        let checksum_hex = checksum.to_hex();
        if buildpack.checksum.as_deref() == Some(checksum_hex.as_str()) && stack == buildpack.stack
        {
            return Ok(false);
        }

        let key = BlobStore::blob_key(&buildpack.guid, &checksum);
        self.blobstore
            .put(&key, artifact)
            .await
            .map_err(|e| upload_failed(&buildpack.name, &e))?;

        let update = ArtifactUpdate {
            artifact_key: key.clone(),
            filename: filename.to_string(),
            checksum: checksum_hex,
            stack,
        };
        if let Err(e) = self.state.set_artifact(&buildpack.guid, &update).await {
            let _ = self.blobstore.delete(&key).await;
            return Err(e);
        }

        if let Some(previous) = buildpack.artifact_key.as_deref() {
            if previous != key {
                // Orphaned blobs are harmless; the row already points at the new one
                let _ = self.blobstore.delete(previous).await;
            }
        }

        Ok(true)
    }
}
