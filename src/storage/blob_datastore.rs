//! Datastore backed by a remote blob container
//!
//! Every value lives in its own object. The object path comes from the
//! [`KeyMapper`], the remote call goes through the injected
//! [`ObjectClient`], and the outcome is translated by
//! [`classify`](crate::storage::classify).

use crate::error::{DatastoreError, DatastoreResult};
use crate::storage::classify::{self, RemoteOp};
use crate::storage::client::{ObjectClient, UserMetadata};
use crate::storage::config::DatastoreConfig;
use crate::storage::datastore_api::{Datastore, Query, QueryEntry};
use crate::storage::key::{Key, KeyMapper, ObjectPath};
use bytes::Bytes;

/// Value of the `author` metadata entry on every written object
pub const METADATA_AUTHOR: &str = "ipfs";

/// Metadata attached to every upload: `author`, plus `app` naming the
/// running executable when the platform can report it.
fn upload_metadata() -> UserMetadata {
    let mut metadata = UserMetadata::from([("author".to_string(), METADATA_AUTHOR.to_string())]);
    match std::env::current_exe() {
        Ok(exe) => {
            metadata.insert("app".to_string(), exe.display().to_string());
        }
        Err(err) => tracing::debug!(error = %err, "executable path unavailable, omitting app metadata"),
    }
    metadata
}

/// Key-value datastore persisting each value as one object in a container.
///
/// Holds only immutable state, so every operation may run concurrently
/// through a shared reference.
#[derive(Debug)]
pub struct BlobDatastore<C> {
    config: DatastoreConfig,
    mapper: KeyMapper,
    metadata: UserMetadata,
    client: C,
}

impl<C: ObjectClient> BlobDatastore<C> {
    /// Build a datastore without touching the remote store.
    ///
    /// Fails with [`DatastoreError::InvalidConfiguration`] when `config` is
    /// rejected. The container is assumed to exist.
    pub fn new(config: DatastoreConfig, client: C) -> DatastoreResult<Self> {
        let config = config.validate()?;
        let mapper = KeyMapper::new(&config.folder_name);
        Ok(Self {
            config,
            mapper,
            metadata: upload_metadata(),
            client,
        })
    }

    /// Build a datastore and make sure its container exists
    pub async fn connect(config: DatastoreConfig, client: C) -> DatastoreResult<Self> {
        let datastore = Self::new(config, client)?;
        let container = datastore.container();

        datastore
            .client
            .ensure_container(container)
            .await
            .map_err(|err| classify::service_error(RemoteOp::EnsureContainer, container, err))?;

        tracing::info!(
            container,
            folder = datastore.mapper.folder(),
            "blob datastore ready"
        );
        Ok(datastore)
    }

    /// Configuration the datastore was built from
    pub fn config(&self) -> &DatastoreConfig {
        &self.config
    }

    /// Underlying object client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Object path a key is stored under
    pub fn object_path(&self, key: &Key) -> ObjectPath {
        self.mapper.object_path(key)
    }

    /// Metadata written with every object
    pub fn upload_metadata(&self) -> &UserMetadata {
        &self.metadata
    }

    fn container(&self) -> &str {
        &self.config.container_name
    }
}

impl<C: ObjectClient> Datastore for BlobDatastore<C> {
    async fn put(&self, key: &Key, value: Bytes) -> DatastoreResult<()> {
        let path = self.object_path(key);
        tracing::debug!(key = %key, path = %path, len = value.len(), "put");

        self.client
            .upload(self.container(), path.as_str(), value, &self.metadata)
            .await
            .map_err(|err| classify::classify(RemoteOp::Upload, key, &path, err))
    }

    async fn get(&self, key: &Key) -> DatastoreResult<Bytes> {
        let path = self.object_path(key);
        tracing::debug!(key = %key, path = %path, "get");

        let body = self
            .client
            .download(self.container(), path.as_str())
            .await
            .map_err(|err| classify::classify(RemoteOp::Download, key, &path, err))?;

        // collect() owns the body and drops the stream on every return path
        body.collect()
            .await
            .map_err(|err| classify::classify(RemoteOp::Download, key, &path, err))
    }

    async fn has(&self, key: &Key) -> DatastoreResult<bool> {
        let path = self.object_path(key);
        tracing::debug!(key = %key, path = %path, "has");

        let lookup = self
            .client
            .stat(self.container(), path.as_str())
            .await
            .map(|_| ());
        classify::classify_presence(&path, lookup)
    }

    async fn get_size(&self, key: &Key) -> DatastoreResult<u64> {
        let path = self.object_path(key);
        tracing::debug!(key = %key, path = %path, "get_size");

        self.client
            .stat(self.container(), path.as_str())
            .await
            .map(|meta| meta.content_length)
            .map_err(|err| classify::classify(RemoteOp::Stat, key, &path, err))
    }

    async fn delete(&self, key: &Key) -> DatastoreResult<()> {
        let path = self.object_path(key);
        tracing::debug!(key = %key, path = %path, "delete");

        self.client
            .delete(self.container(), path.as_str())
            .await
            .map_err(|err| classify::classify(RemoteOp::Delete, key, &path, err))
    }

    async fn sync(&self, _prefix: &Key) -> DatastoreResult<()> {
        // Puts are synchronous remote writes; there is nothing buffered.
        Ok(())
    }

    async fn query(&self, _query: Query) -> DatastoreResult<Vec<QueryEntry>> {
        Err(DatastoreError::Unsupported {
            operation: "blob datastore query".to_string(),
        })
    }

    async fn close(&self) -> DatastoreResult<()> {
        Ok(())
    }
}
