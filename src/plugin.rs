//! Host plugin surface
//!
//! A host application discovers datastores by plugin name and type name,
//! hands over an untyped configuration map, and asks the resulting
//! [`PluginConfig`] to create the datastore. The [`DiskSpec`] identifies a
//! datastore: two configurations with equal disk specs address the same data.

use crate::error::{DatastoreError, DatastoreResult};
use crate::storage::{BlobDatastore, DatastoreConfig, ObjectClient};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Plugin name announced to the host
pub const PLUGIN_NAME: &str = "azure-datastore-plugin";

/// Plugin version announced to the host
pub const PLUGIN_VERSION: &str = "0.0.1";

/// Datastore type name used in host configuration files
pub const DATASTORE_TYPE_NAME: &str = "azure-data-store";

/// Fields that make up the disk spec, in the host's naming
const DISK_SPEC_FIELDS: [&str; 3] = ["accountName", "containerName", "folderName"];

/// Entry point the host registers
#[derive(Debug, Clone, Copy, Default)]
pub struct DatastorePlugin;

impl DatastorePlugin {
    /// Name of the plugin
    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    /// Version of the plugin
    pub fn version(&self) -> &'static str {
        PLUGIN_VERSION
    }

    /// Datastore type this plugin provides
    pub fn datastore_type_name(&self) -> &'static str {
        DATASTORE_TYPE_NAME
    }

    /// Nothing to initialise; present for the host lifecycle
    pub fn init(&self) -> DatastoreResult<()> {
        Ok(())
    }

    /// Parse the host's configuration map.
    ///
    /// All four fields are required strings; an empty `folderName` places
    /// objects at the container root.
    pub fn parse_config(&self, map: &Map<String, Value>) -> DatastoreResult<PluginConfig> {
        let config = DatastoreConfig::new(
            required_str(map, "accountName")?,
            required_str(map, "accountKey")?,
            required_str(map, "containerName")?,
            required_str(map, "folderName")?,
        );
        Ok(PluginConfig { config })
    }
}

fn required_str<'a>(map: &'a Map<String, Value>, field: &str) -> DatastoreResult<&'a str> {
    map.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| DatastoreError::invalid_config(format!("no {} specified", field)))
}

/// Identity of a datastore as seen by the host
pub type DiskSpec = BTreeMap<String, String>;

/// Parsed plugin configuration, ready to create a datastore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    config: DatastoreConfig,
}

impl PluginConfig {
    /// Wrapped datastore configuration
    pub fn datastore_config(&self) -> &DatastoreConfig {
        &self.config
    }

    /// Disk spec: account, container and folder. The key is left out so
    /// rotating it does not change the datastore's identity.
    pub fn disk_spec(&self) -> DiskSpec {
        let values = [
            &self.config.account_name,
            &self.config.container_name,
            &self.config.folder_name,
        ];
        DISK_SPEC_FIELDS
            .iter()
            .zip(values)
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect()
    }

    /// Create the datastore over `client`, provisioning its container
    pub async fn create<C: ObjectClient>(&self, client: C) -> DatastoreResult<BlobDatastore<C>> {
        BlobDatastore::connect(self.config.clone(), client).await
    }
}
