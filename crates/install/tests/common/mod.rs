//! Shared fixtures for install tests

#![allow(dead_code)]

use async_trait::async_trait;
use bpi_errors::{Error, InstallError};
use bpi_install::{ArtifactUploader, BlobstoreUploader, InstallExecutor, InstallPlanner};
use bpi_stack::{ManifestStackExtractor, StackExtractor};
use bpi_state::{ArtifactUpdate, Buildpack, StateManager};
use bpi_store::BlobStore;
use bpi_types::InstallOptions;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

pub struct Harness {
    pub temp: TempDir,
    pub state: StateManager,
    pub blobstore: BlobStore,
    pub extractor: Arc<dyn StackExtractor>,
}

impl Harness {
    pub async fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let state = StateManager::open(&temp.path().join("bpi.sqlite"))
            .await
            .unwrap();
        let blobstore = BlobStore::new(temp.path().join("blobs"));
        Self {
            temp,
            state,
            blobstore,
            extractor: Arc::new(ManifestStackExtractor),
        }
    }

    pub fn planner(&self) -> InstallPlanner {
        InstallPlanner::new(self.state.clone(), self.extractor.clone())
    }

    pub fn uploader(&self) -> BlobstoreUploader {
        BlobstoreUploader::new(
            self.state.clone(),
            self.blobstore.clone(),
            self.extractor.clone(),
        )
    }

    pub fn executor(&self) -> InstallExecutor {
        self.executor_with(Arc::new(self.uploader()))
    }

    pub fn executor_with(&self, uploader: Arc<dyn ArtifactUploader>) -> InstallExecutor {
        InstallExecutor::new(self.state.clone(), self.extractor.clone(), uploader)
    }

    /// Write a buildpack zip, optionally declaring a stack in manifest.yml
    pub fn artifact(&self, file: &str, stack: Option<&str>, payload: &str) -> PathBuf {
        write_artifact(self.temp.path(), file, stack, payload)
    }

    /// Insert a row with an artifact already attached
    pub async fn seed(&self, name: &str, stack: Option<&str>) -> Buildpack {
        let row = self.state.create_locked(name).await.unwrap();
        let update = ArtifactUpdate {
            artifact_key: format!("{}_seed", row.guid),
            filename: format!("{name}-seed.zip"),
            checksum: "seed".to_string(),
            stack: stack.map(str::to_string),
        };
        self.state.set_artifact(&row.guid, &update).await.unwrap();
        self.state.get(&row.guid).await.unwrap().unwrap()
    }

    pub async fn lock(&self, row: &Buildpack) -> Buildpack {
        self.state
            .update_attributes(&row.guid, &InstallOptions::default().with_locked(true))
            .await
            .unwrap();
        self.state.get(&row.guid).await.unwrap().unwrap()
    }
}

pub fn write_artifact(dir: &Path, file: &str, stack: Option<&str>, payload: &str) -> PathBuf {
    let path = dir.join(file);
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    writer
        .start_file("bin/detect", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(payload.as_bytes()).unwrap();
    if let Some(stack) = stack {
        writer
            .start_file("manifest.yml", SimpleFileOptions::default())
            .unwrap();
        writeln!(writer, "language: {payload}\nstack: {stack}").unwrap();
    }
    writer.finish().unwrap();
    path
}

/// Records calls and always fails
#[derive(Default)]
pub struct FailingUploader {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ArtifactUploader for FailingUploader {
    async fn upload(&self, buildpack: &Buildpack, _: &Path, _: &str) -> Result<bool, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(InstallError::UploadFailed {
            name: buildpack.name.clone(),
            message: "blobstore unavailable".to_string(),
        }
        .into())
    }
}

/// Counts calls and delegates to a real uploader
pub struct CountingUploader<U> {
    pub inner: U,
    pub calls: AtomicUsize,
}

impl<U> CountingUploader<U> {
    pub fn new(inner: U) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<U: ArtifactUploader> ArtifactUploader for CountingUploader<U> {
    async fn upload(
        &self,
        buildpack: &Buildpack,
        artifact: &Path,
        filename: &str,
    ) -> Result<bool, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.upload(buildpack, artifact, filename).await
    }
}
