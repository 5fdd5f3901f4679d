#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Stack detection for buildpack artifacts
//!
//! A buildpack artifact is a zip archive. When it targets a specific stack
//! it carries a `manifest.yml` at the archive root with a top-level `stack`
//! key. Detection never fails: anything unreadable counts as "no stack".

use async_trait::async_trait;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Name of the manifest entry inspected for a stack
pub const MANIFEST_ENTRY: &str = "manifest.yml";

/// Manifests larger than this are ignored
pub const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

/// Capability to read the stack an artifact declares
#[async_trait]
pub trait StackExtractor: Send + Sync {
    /// The declared stack, or `None` if the artifact declares none or cannot be read
    async fn extract(&self, artifact: &Path) -> Option<String>;
}

/// Reads `stack` from the artifact's root `manifest.yml`
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestStackExtractor;

#[async_trait]
impl StackExtractor for ManifestStackExtractor {
    async fn extract(&self, artifact: &Path) -> Option<String> {
        let artifact: PathBuf = artifact.to_path_buf();
        tokio::task::spawn_blocking(move || extract_from_file(&artifact))
            .await
            .ok()
            .flatten()
    }
}

/// Synchronously read the declared stack of a zip artifact
#[must_use]
pub fn extract_from_file(artifact: &Path) -> Option<String> {
    let file = File::open(artifact).ok()?;
    let mut archive = zip::ZipArchive::new(file).ok()?;
    let entry = archive.by_name(MANIFEST_ENTRY).ok()?;
    if entry.size() > MAX_MANIFEST_BYTES {
        return None;
    }

    let mut contents = String::new();
    entry.take(MAX_MANIFEST_BYTES).read_to_string(&mut contents).ok()?;
    stack_from_manifest(&contents)
}

/// Pull the `stack` value out of manifest YAML text
#[must_use]
pub fn stack_from_manifest(contents: &str) -> Option<String> {
    let manifest: serde_yml::Value = serde_yml::from_str(contents).ok()?;
    let stack = manifest.get("stack")?.as_str()?.trim();
    if stack.is_empty() {
        None
    } else {
        Some(stack.to_string())
    }
}
