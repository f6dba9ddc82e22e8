//! Error types for the blob datastore
//!
//! Two layers live here:
//! - [`ServiceError`] is what an [`ObjectClient`](crate::storage::ObjectClient)
//!   driver reports. It carries a [`ServiceErrorKind`] so callers can check
//!   failures by value instead of inspecting driver-specific types.
//! - [`DatastoreError`] is the taxonomy exposed by the datastore contract.
//!   Every remote failure is translated into it exactly once, see
//!   [`crate::storage::classify`].

use thiserror::Error;

/// Failure category reported by a remote object store driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    /// The addressed object does not exist
    NotFound,
    /// The container (or object) already exists
    AlreadyExists,
    /// Credentials were rejected or lack permission
    Unauthorized,
    /// The service asked the client to slow down
    Throttled,
    /// The request never produced a response (connect, DNS, timeout)
    Transport,
    /// A response arrived but could not be understood
    MalformedResponse,
    /// Any other service-side failure
    Other,
}

impl ServiceErrorKind {
    /// Short lowercase label used in log fields and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::Unauthorized => "unauthorized",
            Self::Throttled => "throttled",
            Self::Transport => "transport",
            Self::MalformedResponse => "malformed_response",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by an object client driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}{}: {message}", code_suffix(.code))]
pub struct ServiceError {
    /// Failure category
    pub kind: ServiceErrorKind,
    /// Service-specific error code, when the service returned one
    pub code: Option<String>,
    /// Human-readable description
    pub message: String,
}

impl ServiceError {
    /// Create a service error without a service code
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    /// Attach the service-specific error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Shorthand for a [`ServiceErrorKind::NotFound`] error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::NotFound, message)
    }

    /// Whether this error means the addressed object is absent
    pub fn is_not_found(&self) -> bool {
        self.kind == ServiceErrorKind::NotFound
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
}

/// Errors surfaced by the datastore contract
#[derive(Error, Debug)]
pub enum DatastoreError {
    /// The object behind a key does not exist
    #[error("datastore: key not found: {key}")]
    NotFound { key: String },

    /// The operation is never supported by this datastore
    #[error("datastore: {operation} is not supported")]
    Unsupported { operation: String },

    /// Configuration was rejected while building the datastore
    #[error("invalid datastore configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Any other failure reported by the remote store
    #[error("{operation} failed for object '{path}': {source}")]
    Service {
        operation: String,
        path: String,
        #[source]
        source: ServiceError,
    },
}

impl DatastoreError {
    /// Whether this is the not-found signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is the permanent unsupported-operation error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// The driver failure kind behind a [`DatastoreError::Service`] error
    pub fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            Self::Service { source, .. } => Some(source.kind),
            _ => None,
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for datastore results
pub type DatastoreResult<T> = std::result::Result<T, DatastoreError>;

/// Convenience type alias for object client results
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::new(ServiceErrorKind::Throttled, "slow down").with_code("SlowDown");
        assert_eq!(err.to_string(), "throttled (SlowDown): slow down");

        let err = ServiceError::not_found("no such key");
        assert_eq!(err.to_string(), "not_found: no such key");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_datastore_error_display() {
        let err = DatastoreError::Service {
            operation: "upload".to_string(),
            path: "blocks/abc".to_string(),
            source: ServiceError::new(ServiceErrorKind::Transport, "connection reset"),
        };
        assert!(err.to_string().contains("upload failed"));
        assert!(err.to_string().contains("blocks/abc"));
        assert_eq!(err.service_kind(), Some(ServiceErrorKind::Transport));
        assert!(!err.is_not_found());

        let err = DatastoreError::NotFound {
            key: "/a".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.service_kind(), None);
    }
}
