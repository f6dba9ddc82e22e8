//! # Blob Datastore
//!
//! A key-value datastore that persists every value as its own object in a
//! remote blob container.
//!
//! ## Features
//!
//! - **Storage Module**: the [`Datastore`](storage::Datastore) contract, the
//!   blob-backed implementation, key-to-object mapping, error classification
//!   and write batches
//! - **Plugin Module**: host-facing metadata and configuration parsing
//!
//! ## Optional Features
//!
//! - `s3`: S3-compatible object client built on `aws-sdk-s3`
//! - `serde_support`: Serde deserialisation of configuration and the plugin
//!   configuration parser
//!
//! ## Example
//!
//! ```rust
//! use blob_datastore::prelude::*;
//! use bytes::Bytes;
//!
//! # #[tokio::main]
//! # async fn main() -> blob_datastore::DatastoreResult<()> {
//! let config = DatastoreConfig::new("account", "key", "blocks", "");
//! let datastore = BlobDatastore::connect(config, InMemoryObjectClient::new()).await?;
//! datastore.put(&Key::new("/x"), Bytes::from("hello")).await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export core error types
pub use error::{DatastoreError, DatastoreResult, ServiceError, ServiceErrorKind};

// Core modules
pub mod error;
pub mod storage;

#[cfg(feature = "serde_support")]
pub mod plugin;

// Re-export commonly used types
pub mod prelude {
    //! Common types and traits for convenient importing

    pub use crate::error::{DatastoreError, DatastoreResult, ServiceError, ServiceErrorKind};
    pub use crate::storage::{
        Batch, BlobDatastore, Datastore, DatastoreConfig, InMemoryObjectClient, Key, ObjectClient,
    };
}

// Version information
/// The version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
