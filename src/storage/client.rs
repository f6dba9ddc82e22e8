//! The capability surface the datastore needs from a remote object store
//!
//! Drivers implement [`ObjectClient`]; the datastore only ever talks to the
//! remote side through it. Credentials, connection pools, retries and wire
//! encoding are the driver's own business.

use crate::error::ServiceResult;
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::TryStreamExt;
use std::collections::HashMap;
use std::future::Future;

/// User-defined name/value pairs stored alongside an object.
///
/// Names are lowercase; services that send them as headers add their own
/// prefix on the wire.
pub type UserMetadata = HashMap<String, String>;

/// Object metadata returned by a stat call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Content length in bytes
    pub content_length: u64,
    /// Last modified timestamp, if the service reports one
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
    /// ETag or version marker
    pub etag: Option<String>,
    /// User metadata written with the object
    pub metadata: UserMetadata,
}

impl ObjectMeta {
    /// Metadata carrying only a content length
    pub fn with_length(content_length: u64) -> Self {
        Self {
            content_length,
            last_modified: None,
            etag: None,
            metadata: UserMetadata::new(),
        }
    }
}

/// Body of a downloaded object.
///
/// Owns the underlying response stream; dropping the body releases the
/// connection whether or not it was read to the end.
pub struct ObjectBody {
    stream: BoxStream<'static, ServiceResult<Bytes>>,
    content_length: Option<u64>,
}

impl ObjectBody {
    /// Wrap a chunk stream
    pub fn new(stream: BoxStream<'static, ServiceResult<Bytes>>, content_length: Option<u64>) -> Self {
        Self {
            stream,
            content_length,
        }
    }

    /// Body made of a single in-memory buffer
    pub fn from_bytes(data: Bytes) -> Self {
        let len = data.len() as u64;
        Self::new(Box::pin(futures::stream::once(async move { Ok(data) })), Some(len))
    }

    /// Content length announced by the service, if any
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Read the remaining chunks into one buffer, consuming the body.
    ///
    /// The stream is dropped before returning on both the success and the
    /// error path.
    pub async fn collect(mut self) -> ServiceResult<Bytes> {
        let mut buf = match self.content_length {
            Some(len) => BytesMut::with_capacity(usize::try_from(len).unwrap_or(0)),
            None => BytesMut::new(),
        };
        while let Some(chunk) = self.stream.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Remote object store driver.
///
/// Every method returns a [`ServiceError`](crate::error::ServiceError) whose kind is
/// [`NotFound`](crate::error::ServiceErrorKind::NotFound) exactly when the
/// addressed object is absent. Deadlines are honoured by dropping the
/// returned future.
pub trait ObjectClient: Send + Sync {
    /// Upload `data` as the complete content of `path`, replacing any
    /// existing object and its metadata
    fn upload(
        &self,
        container: &str,
        path: &str,
        data: Bytes,
        metadata: &UserMetadata,
    ) -> impl Future<Output = ServiceResult<()>> + Send;

    /// Open the full content of `path` for reading
    fn download(&self, container: &str, path: &str) -> impl Future<Output = ServiceResult<ObjectBody>> + Send;

    /// Fetch metadata for `path` without transferring its content
    fn stat(&self, container: &str, path: &str) -> impl Future<Output = ServiceResult<ObjectMeta>> + Send;

    /// Delete `path`; reports not-found when there was nothing to delete
    fn delete(&self, container: &str, path: &str) -> impl Future<Output = ServiceResult<()>> + Send;

    /// Create the container if it does not exist yet. Idempotent.
    fn ensure_container(&self, container: &str) -> impl Future<Output = ServiceResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ServiceError, ServiceErrorKind};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn flagged_body(chunks: Vec<ServiceResult<Bytes>>, flag: Arc<AtomicBool>) -> ObjectBody {
        let guard = DropFlag(flag);
        let stream = futures::stream::iter(chunks).map_ok(move |chunk| {
            let _keep = &guard;
            chunk
        });
        ObjectBody::new(Box::pin(stream), None)
    }

    #[tokio::test]
    async fn test_collect_concatenates_chunks() {
        let released = Arc::new(AtomicBool::new(false));
        let body = flagged_body(
            vec![Ok(Bytes::from("hel")), Ok(Bytes::from("lo"))],
            released.clone(),
        );
        assert_eq!(body.collect().await.unwrap(), Bytes::from("hello"));
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_collect_releases_stream_on_error() {
        let released = Arc::new(AtomicBool::new(false));
        let body = flagged_body(
            vec![
                Ok(Bytes::from("partial")),
                Err(ServiceError::new(ServiceErrorKind::Transport, "reset")),
                Ok(Bytes::from("never read")),
            ],
            released.clone(),
        );
        let err = body.collect().await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Transport);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_from_bytes() {
        let body = ObjectBody::from_bytes(Bytes::from_static(b"abc"));
        assert_eq!(body.content_length(), Some(3));
        assert_eq!(body.collect().await.unwrap(), Bytes::from_static(b"abc"));
    }
}
