//! Client-side write batches
//!
//! A [`Batch`] collects puts and deletes in memory and replays them against
//! its datastore on [`Batch::commit`]. Staging never touches the remote
//! store. Commit applies entries one at a time and stops at the first
//! failure: entries applied before it stay applied, the rest are dropped.
//! There is no rollback and no ordering guarantee across keys.

use crate::error::DatastoreResult;
use crate::storage::datastore_api::Datastore;
use crate::storage::key::Key;
use bytes::Bytes;
use std::collections::HashMap;

/// Pending operation for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Write this value
    Put(Bytes),
    /// Remove the key
    Delete,
}

/// Staged writes and deletes against a datastore.
///
/// Only the last operation staged for a key survives. Dropping a batch
/// without committing discards it with no remote effect.
#[derive(Debug)]
pub struct Batch<'a, D> {
    datastore: &'a D,
    ops: HashMap<Key, BatchOp>,
}

impl<'a, D: Datastore> Batch<'a, D> {
    /// Open an empty batch on `datastore`
    pub fn new(datastore: &'a D) -> Self {
        Self {
            datastore,
            ops: HashMap::new(),
        }
    }

    /// Stage a write, replacing anything already staged for `key`
    pub fn put(&mut self, key: Key, value: Bytes) {
        self.ops.insert(key, BatchOp::Put(value));
    }

    /// Stage a delete, replacing anything already staged for `key`
    pub fn delete(&mut self, key: Key) {
        self.ops.insert(key, BatchOp::Delete);
    }

    /// Operation currently staged for `key`
    pub fn pending(&self, key: &Key) -> Option<&BatchOp> {
        self.ops.get(key)
    }

    /// Number of keys with a staged operation
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every staged operation, consuming the batch.
    ///
    /// The first failing operation aborts the commit and its error is
    /// returned unchanged.
    pub async fn commit(self) -> DatastoreResult<()> {
        let total = self.ops.len();
        let mut applied = 0usize;

        for (key, op) in self.ops {
            let result = match op {
                BatchOp::Delete => self.datastore.delete(&key).await,
                BatchOp::Put(value) => self.datastore.put(&key, value).await,
            };
            if let Err(err) = result {
                tracing::warn!(
                    key = %key,
                    applied,
                    total,
                    "batch commit aborted: {}",
                    err
                );
                return Err(err);
            }
            applied += 1;
        }

        tracing::debug!(applied, "batch committed");
        Ok(())
    }
}
