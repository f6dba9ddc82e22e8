//! Blob-backed key-value storage
//!
//! This module provides a key-value [`Datastore`] whose values live as
//! individual objects in a remote blob container:
//! - **Keys** - hierarchical logical keys and their mapping to object paths
//! - **Object clients** - the driver seam to the remote store, with an
//!   in-memory client and an S3 client (optional, requires `s3` feature)
//! - **Error classification** - driver failures reduced to the datastore's
//!   error taxonomy
//! - **Batches** - staged puts and deletes replayed on commit
//!
//! # Examples
//!
//! ```rust
//! use blob_datastore::storage::{BlobDatastore, Datastore, DatastoreConfig, InMemoryObjectClient, Key};
//! use bytes::Bytes;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatastoreConfig::new("account", "key", "blocks", "ipfs");
//! let datastore = BlobDatastore::connect(config, InMemoryObjectClient::new()).await?;
//!
//! let key = Key::new("/blocks/CIQA4T3TD3BP3C2M");
//! assert!(!datastore.has(&key).await?);
//!
//! datastore.put(&key, Bytes::from("hello")).await?;
//! assert_eq!(datastore.get(&key).await?, Bytes::from("hello"));
//! assert_eq!(datastore.get_size(&key).await?, 5);
//!
//! let mut batch = datastore.batch();
//! batch.delete(key.clone());
//! batch.commit().await?;
//! assert!(!datastore.has(&key).await?);
//! # Ok(())
//! # }
//! ```
//!
//! ## S3 Storage (requires `s3` feature)
//!
//! ```rust,ignore
//! use blob_datastore::storage::{BlobDatastore, DatastoreConfig, S3Config, S3ObjectClient};
//!
//! let config = DatastoreConfig::new("access-key", "secret-key", "my-bucket", "ipfs");
//! let client = S3ObjectClient::new(&config, &S3Config::default()).await;
//! let datastore = BlobDatastore::connect(config, client).await?;
//! ```

pub mod batch;
pub mod blob_datastore;
pub mod classify;
pub mod client;
pub mod config;
pub mod datastore_api;
pub mod key;
pub mod memory_client;

#[cfg(feature = "s3")]
pub mod storage_s3;

pub use batch::{Batch, BatchOp};
pub use blob_datastore::BlobDatastore;
pub use client::{ObjectBody, ObjectClient, ObjectMeta, UserMetadata};
pub use config::DatastoreConfig;
pub use datastore_api::{Datastore, Query, QueryEntry};
pub use key::{Key, KeyMapper, ObjectPath};
pub use memory_client::InMemoryObjectClient;

#[cfg(feature = "s3")]
pub use storage_s3::{S3Config, S3ObjectClient};
