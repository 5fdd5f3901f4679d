//! Blobstore uploader behaviour

mod common;

use bpi_errors::InstallError;
use bpi_install::ArtifactUploader;
use bpi_store::{BlobStore, Checksum};
use common::Harness;

#[tokio::test]
async fn test_upload_records_artifact_and_stack() {
    let h = Harness::new().await;
    let row = h.state.create_locked("ruby").await.unwrap();
    let artifact = h.artifact("ruby.zip", Some("cflinuxfs4"), "ruby");

    let changed = h
        .uploader()
        .upload(&row, &artifact, "ruby_buildpack-v1.zip")
        .await
        .unwrap();
    assert!(changed);

    let checksum = Checksum::of_file(&artifact).await.unwrap();
    let stored = h.state.get(&row.guid).await.unwrap().unwrap();
    assert_eq!(stored.stack.as_deref(), Some("cflinuxfs4"));
    assert_eq!(stored.filename.as_deref(), Some("ruby_buildpack-v1.zip"));
    assert_eq!(stored.checksum.as_deref(), Some(checksum.to_hex().as_str()));
    assert_eq!(
        stored.artifact_key.as_deref(),
        Some(BlobStore::blob_key(&row.guid, &checksum).as_str())
    );
}

#[tokio::test]
async fn test_identical_artifact_is_not_stored_again() {
    let h = Harness::new().await;
    let row = h.state.create_locked("ruby").await.unwrap();
    let artifact = h.artifact("ruby.zip", None, "ruby");
    let uploader = h.uploader();

    assert!(uploader.upload(&row, &artifact, "ruby.zip").await.unwrap());
    let stored = h.state.get(&row.guid).await.unwrap().unwrap();
    assert!(!uploader.upload(&stored, &artifact, "ruby.zip").await.unwrap());
    assert_eq!(h.state.get(&row.guid).await.unwrap().unwrap(), stored);
}

#[tokio::test]
async fn test_replacing_artifact_drops_previous_blob() {
    let h = Harness::new().await;
    let row = h.state.create_locked("go").await.unwrap();
    let uploader = h.uploader();

    let v1 = h.artifact("go-v1.zip", None, "go v1");
    uploader.upload(&row, &v1, "go-v1.zip").await.unwrap();
    let first = h.state.get(&row.guid).await.unwrap().unwrap();
    let first_key = first.artifact_key.clone().unwrap();

    let v2 = h.artifact("go-v2.zip", None, "go v2");
    assert!(uploader.upload(&first, &v2, "go-v2.zip").await.unwrap());
    let second = h.state.get(&row.guid).await.unwrap().unwrap();
    let second_key = second.artifact_key.unwrap();

    assert_ne!(first_key, second_key);
    assert!(!h.blobstore.exists(&first_key).await);
    assert!(h.blobstore.exists(&second_key).await);
}

#[tokio::test]
async fn test_stacked_row_rejects_other_stack() {
    let h = Harness::new().await;
    let row = h.seed("java", Some("cflinuxfs3")).await;
    let artifact = h.artifact("java.zip", Some("cflinuxfs4"), "java");

    let err = h.uploader().upload(&row, &artifact, "java.zip").await.unwrap_err();
    assert_eq!(
        err.as_install(),
        Some(&InstallError::StackMismatch {
            existing: "cflinuxfs3".to_string(),
            uploaded: "cflinuxfs4".to_string(),
        })
    );

    let stackless = h.artifact("java-any.zip", None, "java");
    let err = h
        .uploader()
        .upload(&row, &stackless, "java-any.zip")
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_install(),
        Some(InstallError::StackMismatch { uploaded, .. }) if uploaded == "<none>"
    ));
    assert_eq!(h.state.get(&row.guid).await.unwrap().unwrap(), row);
}

#[tokio::test]
async fn test_stackless_row_cannot_take_held_stack() {
    let h = Harness::new().await;
    let stackless = h.seed("php", None).await;
    h.seed("php", Some("cflinuxfs4")).await;
    let artifact = h.artifact("php.zip", Some("cflinuxfs4"), "php");

    let err = h
        .uploader()
        .upload(&stackless, &artifact, "php.zip")
        .await
        .unwrap_err();
    assert_eq!(
        err.as_install(),
        Some(&InstallError::StackConflict {
            name: "php".to_string(),
            stack: "cflinuxfs4".to_string(),
        })
    );
}

#[tokio::test]
async fn test_missing_artifact_is_reported() {
    let h = Harness::new().await;
    let row = h.state.create_locked("r").await.unwrap();
    let missing = h.temp.path().join("absent.zip");

    let err = h.uploader().upload(&row, &missing, "absent.zip").await.unwrap_err();
    assert!(matches!(
        err.as_install(),
        Some(InstallError::ArtifactNotFound { .. })
    ));
}
