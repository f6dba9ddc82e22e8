//! In-memory object client
//!
//! Behaves like a remote blob service as far as the datastore can tell:
//! containers must be provisioned before use, missing objects report
//! not-found, and deletes of missing objects fail. Handy for tests and for
//! embedding the datastore without a network.

use crate::error::{ServiceError, ServiceErrorKind, ServiceResult};
use crate::storage::client::{ObjectBody, ObjectClient, ObjectMeta, UserMetadata};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    meta: ObjectMeta,
}

type Containers = HashMap<String, HashMap<String, StoredObject>>;

/// Object client keeping containers and objects in process memory.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectClient {
    containers: Arc<RwLock<Containers>>,
    injected: Arc<Mutex<Option<ServiceError>>>,
    version: Arc<Mutex<u64>>,
}

impl InMemoryObjectClient {
    /// Create an empty client with no containers
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call on this client fail with `err`
    pub fn fail_next(&self, err: ServiceError) {
        *lock(&self.injected) = Some(err);
    }

    /// Whether `container` has been provisioned
    pub fn has_container(&self, container: &str) -> bool {
        self.read().contains_key(container)
    }

    /// Raw content of an object, bypassing the datastore
    pub fn object(&self, container: &str, path: &str) -> Option<Bytes> {
        self.read()
            .get(container)
            .and_then(|objects| objects.get(path))
            .map(|object| object.data.clone())
    }

    /// Number of objects stored in `container`
    pub fn object_count(&self, container: &str) -> usize {
        self.read().get(container).map_or(0, HashMap::len)
    }

    fn read(&self) -> RwLockReadGuard<'_, Containers> {
        self.containers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Containers> {
        self.containers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_injected(&self) -> ServiceResult<()> {
        match lock(&self.injected).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_etag(&self) -> String {
        let mut version = lock(&self.version);
        *version += 1;
        format!("\"{:016x}\"", *version)
    }

    fn with_object<T>(
        &self,
        container: &str,
        path: &str,
        f: impl FnOnce(&StoredObject) -> T,
    ) -> ServiceResult<T> {
        self.take_injected()?;
        let containers = self.read();
        let objects = containers.get(container).ok_or_else(|| container_missing(container))?;
        objects
            .get(path)
            .map(f)
            .ok_or_else(|| blob_missing(container, path))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn container_missing(container: &str) -> ServiceError {
    ServiceError::new(
        ServiceErrorKind::Other,
        format!("the specified container '{}' does not exist", container),
    )
    .with_code("ContainerNotFound")
}

fn blob_missing(container: &str, path: &str) -> ServiceError {
    ServiceError::not_found(format!(
        "the specified blob '{}/{}' does not exist",
        container, path
    ))
    .with_code("BlobNotFound")
}

impl ObjectClient for InMemoryObjectClient {
    async fn upload(
        &self,
        container: &str,
        path: &str,
        data: Bytes,
        metadata: &UserMetadata,
    ) -> ServiceResult<()> {
        self.take_injected()?;
        let etag = self.next_etag();
        let mut containers = self.write();
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| container_missing(container))?;

        let meta = ObjectMeta {
            content_length: data.len() as u64,
            last_modified: Some(chrono::Utc::now()),
            etag: Some(etag),
            metadata: metadata.clone(),
        };
        objects.insert(path.to_string(), StoredObject { data, meta });
        Ok(())
    }

    async fn download(&self, container: &str, path: &str) -> ServiceResult<ObjectBody> {
        let data = self.with_object(container, path, |object| object.data.clone())?;
        Ok(ObjectBody::from_bytes(data))
    }

    async fn stat(&self, container: &str, path: &str) -> ServiceResult<ObjectMeta> {
        self.with_object(container, path, |object| object.meta.clone())
    }

    async fn delete(&self, container: &str, path: &str) -> ServiceResult<()> {
        self.take_injected()?;
        let mut containers = self.write();
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| container_missing(container))?;
        objects
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| blob_missing(container, path))
    }

    async fn ensure_container(&self, container: &str) -> ServiceResult<()> {
        self.take_injected()?;
        self.write().entry(container.to_string()).or_default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_metadata() -> UserMetadata {
        UserMetadata::new()
    }

    #[tokio::test]
    async fn test_roundtrip_and_metadata() {
        let client = InMemoryObjectClient::new();
        client.ensure_container("c1").await.unwrap();
        let metadata = UserMetadata::from([("author".to_string(), "ipfs".to_string())]);
        client.upload("c1", "a/b", Bytes::from("hello"), &metadata).await.unwrap();

        let meta = client.stat("c1", "a/b").await.unwrap();
        assert_eq!(meta.content_length, 5);
        assert!(meta.etag.is_some());
        assert!(meta.last_modified.is_some());
        assert_eq!(meta.metadata, metadata);

        let body = client.download("c1", "a/b").await.unwrap();
        assert_eq!(body.collect().await.unwrap(), Bytes::from("hello"));
    }

    #[tokio::test]
    async fn test_etag_changes_on_overwrite() {
        let client = InMemoryObjectClient::new();
        client.ensure_container("c1").await.unwrap();
        client.upload("c1", "k", Bytes::from("1"), &no_metadata()).await.unwrap();
        let first = client.stat("c1", "k").await.unwrap().etag;
        client.upload("c1", "k", Bytes::from("2"), &no_metadata()).await.unwrap();
        let second = client.stat("c1", "k").await.unwrap().etag;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_metadata() {
        let client = InMemoryObjectClient::new();
        client.ensure_container("c1").await.unwrap();
        let tagged = UserMetadata::from([("app".to_string(), "old".to_string())]);
        client.upload("c1", "k", Bytes::from("1"), &tagged).await.unwrap();
        client.upload("c1", "k", Bytes::from("2"), &no_metadata()).await.unwrap();
        assert!(client.stat("c1", "k").await.unwrap().metadata.is_empty());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let client = InMemoryObjectClient::new();
        client.ensure_container("c1").await.unwrap();

        assert!(client.stat("c1", "nope").await.unwrap_err().is_not_found());
        assert!(client.download("c1", "nope").await.unwrap_err().is_not_found());
        let err = client.delete("c1", "nope").await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("BlobNotFound"));
    }

    #[tokio::test]
    async fn test_missing_container_is_not_object_not_found() {
        let client = InMemoryObjectClient::new();
        let err = client.stat("absent", "k").await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Other);
        assert_eq!(err.code.as_deref(), Some("ContainerNotFound"));
    }

    #[tokio::test]
    async fn test_fail_next_applies_once() {
        let client = InMemoryObjectClient::new();
        client.ensure_container("c1").await.unwrap();
        client.fail_next(ServiceError::new(ServiceErrorKind::Throttled, "busy"));

        let err = client.upload("c1", "k", Bytes::new(), &no_metadata()).await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Throttled);
        client.upload("c1", "k", Bytes::new(), &no_metadata()).await.unwrap();
        assert_eq!(client.object_count("c1"), 1);
    }
}
