//! Integration tests for error types

#[cfg(test)]
mod tests {
    use bpi_errors::*;

    #[test]
    fn test_error_conversion() {
        let install_err = InstallError::AmbiguousTarget {
            name: "ruby_buildpack".into(),
            count: 2,
        };
        let err: Error = install_err.clone().into();
        assert!(matches!(err, Error::Install(_)));
        assert_eq!(err.as_install(), Some(&install_err));
    }

    #[test]
    fn test_error_display() {
        let err = InstallError::StacklessIncompatible {
            name: "go_buildpack".into(),
            stack: "cflinuxfs4".into(),
        };
        assert_eq!(
            err.to_string(),
            "existing buildpack go_buildpack (stack cflinuxfs4) must be upgraded with a buildpack that has a stack"
        );

        let dup = InstallError::DuplicateInstall {
            name: "go_buildpack".into(),
            stack: None,
        };
        assert_eq!(
            dup.to_string(),
            "buildpack go_buildpack is already planned for stack <none>"
        );
    }

    #[test]
    fn test_planning_rejections_are_not_retryable() {
        let dup: Error = InstallError::DuplicateInstall {
            name: "n1".into(),
            stack: Some("cflinuxfs4".into()),
        }
        .into();
        assert!(!dup.is_retryable());
        assert_eq!(dup.user_code(), Some("install.duplicate"));

        let upload: Error = InstallError::UploadFailed {
            name: "n1".into(),
            message: "connection reset".into(),
        }
        .into();
        assert!(upload.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err =
            StorageError::from_io_with_path(&io_err, std::path::Path::new("/var/blobs"));
        assert!(matches!(storage_err, StorageError::PermissionDenied { .. }));

        let err: Error = std::io::Error::other("boom").into();
        assert_eq!(err.user_code(), Some("error.io"));
    }
}
