#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Buildpack blobstore for bpi
//!
//! Artifacts are kept under a root directory, sharded by the first four
//! characters of their key. Blobs are immutable: a new upload always gets a
//! new key, and the previous blob is deleted once the row points elsewhere.

mod digest;

pub use digest::Checksum;

use bpi_errors::{Error, StorageError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filesystem blobstore
#[derive(Clone, Debug)]
pub struct BlobStore {
    base_path: PathBuf,
}

impl BlobStore {
    /// Create a new store instance
    #[must_use]
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Key under which a buildpack's artifact is stored
    #[must_use]
    pub fn blob_key(guid: &str, checksum: &Checksum) -> String {
        format!("{guid}_{checksum}")
    }

    /// Get the on-disk path for a key
    ///
    /// # Errors
    ///
    /// Returns an error if the key is too short or contains characters that
    /// could escape the store root.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        let valid = key.len() > 4
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            }
            .into());
        }
        Ok(self.base_path.join(&key[..2]).join(&key[2..4]).join(key))
    }

    /// Check if a blob exists
    pub async fn exists(&self, key: &str) -> bool {
        match self.path_for(key) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Copy `source` into the store under `key`
    ///
    /// The copy lands in a temporary sibling first and is renamed into
    /// place, so readers never observe a partial blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or any filesystem operation fails.
    pub async fn put(&self, key: &str, source: &Path) -> Result<u64, Error> {
        let dest = self.path_for(key)?;
        let parent = dest
            .parent()
            .ok_or_else(|| Error::internal(format!("blob path has no parent: {}", dest.display())))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, parent))?;

        let temp = parent.join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4()));
        let bytes = match fs::copy(source, &temp).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(&temp).await;
                return Err(StorageError::from_io_with_path(&e, source).into());
            }
        };

        if let Err(e) = fs::rename(&temp, &dest).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::from_io_with_path(&e, &dest).into());
        }

        Ok(bytes)
    }

    /// Remove a blob; missing blobs are not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or removal fails.
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_io_with_path(&e, &path).into()),
        }
    }
}
