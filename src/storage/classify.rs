//! Translation of driver failures into datastore errors
//!
//! Each remote call result passes through exactly one of these functions.
//! Nothing here retries.

use crate::error::{DatastoreError, ServiceError};
use crate::storage::key::{Key, ObjectPath};

/// Remote call being classified, used for error context and log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    /// Object upload
    Upload,
    /// Object download, including reading the body
    Download,
    /// Metadata lookup
    Stat,
    /// Object deletion
    Delete,
    /// Container provisioning
    EnsureContainer,
}

impl RemoteOp {
    /// Operation name as it appears in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Stat => "stat",
            Self::Delete => "delete",
            Self::EnsureContainer => "ensure_container",
        }
    }
}

/// Classify a failure where absence is an error: `NotFound` maps to
/// [`DatastoreError::NotFound`], anything else to [`DatastoreError::Service`].
pub fn classify(op: RemoteOp, key: &Key, path: &ObjectPath, err: ServiceError) -> DatastoreError {
    if err.is_not_found() {
        DatastoreError::NotFound {
            key: key.to_string(),
        }
    } else {
        service_error(op, path.as_str(), err)
    }
}

/// Classify a metadata lookup made on behalf of an existence check.
///
/// Absence is the ordinary `false` answer; every other failure is still an
/// error.
pub fn classify_presence(path: &ObjectPath, result: Result<(), ServiceError>) -> Result<bool, DatastoreError> {
    match result {
        Ok(()) => Ok(true),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(service_error(RemoteOp::Stat, path.as_str(), err)),
    }
}

/// Wrap a failure as a [`DatastoreError::Service`] without inspecting it
pub fn service_error(op: RemoteOp, path: &str, err: ServiceError) -> DatastoreError {
    tracing::warn!(
        operation = op.as_str(),
        path,
        kind = err.kind.as_str(),
        code = err.code.as_deref().unwrap_or(""),
        "remote store call failed: {}",
        err.message
    );
    DatastoreError::Service {
        operation: op.as_str().to_string(),
        path: path.to_string(),
        source: err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceErrorKind;
    use crate::storage::key::KeyMapper;

    fn fixture() -> (Key, ObjectPath) {
        let key = Key::new("/blocks/ABC");
        let path = KeyMapper::new("ipfs").object_path(&key);
        (key, path)
    }

    #[test]
    fn test_not_found_becomes_datastore_not_found() {
        let (key, path) = fixture();
        let err = classify(RemoteOp::Download, &key, &path, ServiceError::not_found("BlobNotFound"));
        match err {
            DatastoreError::NotFound { key } => assert_eq!(key, "/blocks/ABC"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_other_kinds_become_service_errors() {
        let (key, path) = fixture();
        for kind in [
            ServiceErrorKind::Unauthorized,
            ServiceErrorKind::Throttled,
            ServiceErrorKind::Transport,
            ServiceErrorKind::MalformedResponse,
            ServiceErrorKind::AlreadyExists,
            ServiceErrorKind::Other,
        ] {
            let err = classify(RemoteOp::Upload, &key, &path, ServiceError::new(kind, "boom"));
            match err {
                DatastoreError::Service {
                    operation,
                    path,
                    source,
                } => {
                    assert_eq!(operation, "upload");
                    assert_eq!(path, "ipfs/blocks/ABC");
                    assert_eq!(source.kind, kind);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_presence() {
        let (_, path) = fixture();
        assert!(classify_presence(&path, Ok(())).unwrap());
        assert!(!classify_presence(&path, Err(ServiceError::not_found("gone"))).unwrap());

        let err = classify_presence(
            &path,
            Err(ServiceError::new(ServiceErrorKind::Unauthorized, "denied")),
        )
        .unwrap_err();
        assert_eq!(err.service_kind(), Some(ServiceErrorKind::Unauthorized));
    }
}
