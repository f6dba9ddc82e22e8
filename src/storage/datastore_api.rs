//! The key-value datastore contract
//!
//! This module defines the operations every datastore exposes to its host,
//! independent of where values are kept.

use crate::error::DatastoreResult;
use crate::storage::batch::Batch;
use crate::storage::key::Key;
use bytes::Bytes;
use std::future::Future;

/// Query description accepted by [`Datastore::query`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Only return entries below this key
    pub prefix: Option<Key>,
    /// Maximum number of entries (0 means unlimited)
    pub limit: usize,
    /// Number of entries to skip
    pub offset: usize,
    /// Return keys without values
    pub keys_only: bool,
    /// Return value sizes alongside keys
    pub return_sizes: bool,
}

impl Query {
    /// Query over everything below `prefix`
    pub fn with_prefix(prefix: impl Into<Key>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Default::default()
        }
    }
}

/// One result row of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEntry {
    /// Entry key
    pub key: Key,
    /// Entry value, absent for keys-only queries
    pub value: Option<Bytes>,
    /// Value size, when requested
    pub size: Option<u64>,
}

/// Key-value datastore operations
pub trait Datastore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &Key, value: Bytes) -> impl Future<Output = DatastoreResult<()>> + Send;

    /// Fetch the value under `key`; fails with `NotFound` when absent
    fn get(&self, key: &Key) -> impl Future<Output = DatastoreResult<Bytes>> + Send;

    /// Whether a value exists under `key`; absence is `Ok(false)`, not an error
    fn has(&self, key: &Key) -> impl Future<Output = DatastoreResult<bool>> + Send;

    /// Size in bytes of the value under `key`; fails with `NotFound` when absent
    fn get_size(&self, key: &Key) -> impl Future<Output = DatastoreResult<u64>> + Send;

    /// Remove the value under `key`; fails with `NotFound` when absent
    fn delete(&self, key: &Key) -> impl Future<Output = DatastoreResult<()>> + Send;

    /// Flush buffered writes below `prefix` to durable storage
    fn sync(&self, prefix: &Key) -> impl Future<Output = DatastoreResult<()>> + Send;

    /// Run a query over the key space
    fn query(&self, query: Query) -> impl Future<Output = DatastoreResult<Vec<QueryEntry>>> + Send;

    /// Release resources held by the datastore
    fn close(&self) -> impl Future<Output = DatastoreResult<()>> + Send;

    /// Open a batch that stages writes and deletes until committed
    fn batch(&self) -> Batch<'_, Self>
    where
        Self: Sized,
    {
        Batch::new(self)
    }
}
