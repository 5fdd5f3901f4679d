//! Integration tests for stack detection

use bpi_stack::{extract_from_file, ManifestStackExtractor, StackExtractor, MAX_MANIFEST_BYTES};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn write_zip(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (entry, data) in entries {
        writer
            .start_file(*entry, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
    path
}

#[tokio::test]
async fn test_manifest_stack_is_detected() {
    let temp = TempDir::new().unwrap();
    let artifact = write_zip(
        temp.path(),
        "ruby.zip",
        &[
            ("bin/detect", b"#!/bin/sh\nexit 0\n"),
            ("manifest.yml", b"language: ruby\nstack: cflinuxfs4\n"),
        ],
    );

    let stack = ManifestStackExtractor.extract(&artifact).await;
    assert_eq!(stack.as_deref(), Some("cflinuxfs4"));
}

#[tokio::test]
async fn test_zip_without_manifest_has_no_stack() {
    let temp = TempDir::new().unwrap();
    let artifact = write_zip(temp.path(), "go.zip", &[("bin/compile", b"echo")]);

    assert_eq!(ManifestStackExtractor.extract(&artifact).await, None);
}

#[tokio::test]
async fn test_nested_manifest_is_ignored() {
    let temp = TempDir::new().unwrap();
    let artifact = write_zip(
        temp.path(),
        "nested.zip",
        &[("pack/manifest.yml", b"stack: cflinuxfs4\n")],
    );

    assert_eq!(ManifestStackExtractor.extract(&artifact).await, None);
}

#[tokio::test]
async fn test_non_zip_and_missing_files_have_no_stack() {
    let temp = TempDir::new().unwrap();
    let plain = temp.path().join("not-a-zip.zip");
    std::fs::write(&plain, b"plain text, no archive here").unwrap();

    assert_eq!(ManifestStackExtractor.extract(&plain).await, None);
    assert_eq!(
        ManifestStackExtractor
            .extract(&temp.path().join("missing.zip"))
            .await,
        None
    );
}

#[test]
fn test_malformed_manifest_has_no_stack() {
    let temp = TempDir::new().unwrap();
    let artifact = write_zip(
        temp.path(),
        "bad.zip",
        &[("manifest.yml", b"stack: [broken\n  - yaml")],
    );

    assert_eq!(extract_from_file(&artifact), None);
}

#[test]
fn test_oversized_manifest_is_ignored() {
    let temp = TempDir::new().unwrap();
    let mut manifest = b"stack: cflinuxfs4\n".to_vec();
    let padding = usize::try_from(MAX_MANIFEST_BYTES).unwrap() + 1;
    manifest.extend(std::iter::repeat_n(b'#', padding));

    let artifact = write_zip(temp.path(), "big.zip", &[("manifest.yml", &manifest)]);
    assert_eq!(extract_from_file(&artifact), None);
}

#[tokio::test]
async fn test_extractor_usable_as_trait_object() {
    let temp = TempDir::new().unwrap();
    let artifact = write_zip(
        temp.path(),
        "java.zip",
        &[("manifest.yml", b"stack: cflinuxfs3\n")],
    );

    let extractor: Box<dyn StackExtractor> = Box::new(ManifestStackExtractor);
    assert_eq!(
        extractor.extract(&artifact).await.as_deref(),
        Some("cflinuxfs3")
    );
}
