//! Datastore configuration

use crate::error::{DatastoreError, DatastoreResult};

/// Minimum container name length accepted by blob services
pub const MIN_CONTAINER_NAME_LEN: usize = 3;

/// Maximum container name length accepted by blob services
pub const MAX_CONTAINER_NAME_LEN: usize = 63;

/// Account, container and folder a datastore persists into
#[derive(Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde_support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde_support", serde(rename_all = "camelCase"))]
pub struct DatastoreConfig {
    /// Storage account name (access key id for S3-compatible stores)
    pub account_name: String,
    /// Storage account key (secret access key for S3-compatible stores)
    pub account_key: String,
    /// Container (bucket) holding the objects
    pub container_name: String,
    /// Folder prefix placed in front of every object path
    #[cfg_attr(feature = "serde_support", serde(default))]
    pub folder_name: String,
}

impl DatastoreConfig {
    /// Create a configuration from its four fields
    pub fn new(
        account_name: impl Into<String>,
        account_key: impl Into<String>,
        container_name: impl Into<String>,
        folder_name: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_key: account_key.into(),
            container_name: container_name.into(),
            folder_name: folder_name.into(),
        }
    }

    /// Check the configuration and normalise the folder name.
    ///
    /// A trailing `/` on the folder is dropped; a leading one is rejected
    /// because it would produce object names with an empty first segment.
    pub fn validate(mut self) -> DatastoreResult<Self> {
        if self.account_name.trim().is_empty() {
            return Err(DatastoreError::invalid_config("account name cannot be empty"));
        }
        if self.account_key.is_empty() {
            return Err(DatastoreError::invalid_config("account key cannot be empty"));
        }
        validate_container_name(&self.container_name)?;

        if self.folder_name.starts_with('/') {
            return Err(DatastoreError::invalid_config(format!(
                "folder name '{}' must not start with '/'",
                self.folder_name
            )));
        }
        if self.folder_name.contains('\0') {
            return Err(DatastoreError::invalid_config("folder name contains a NUL byte"));
        }
        let trimmed = self.folder_name.trim_end_matches('/').len();
        self.folder_name.truncate(trimmed);

        Ok(self)
    }
}

// The account key stays out of logs and panics.
impl std::fmt::Debug for DatastoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatastoreConfig")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("container_name", &self.container_name)
            .field("folder_name", &self.folder_name)
            .finish()
    }
}

/// Check a container name against the naming rules shared by blob services:
/// 3 to 63 characters, lowercase letters, digits and single hyphens, starting
/// and ending with a letter or digit.
pub fn validate_container_name(name: &str) -> DatastoreResult<()> {
    let invalid = |reason: &str| {
        Err(DatastoreError::invalid_config(format!(
            "container name '{}' {}",
            name, reason
        )))
    };

    if name.len() < MIN_CONTAINER_NAME_LEN || name.len() > MAX_CONTAINER_NAME_LEN {
        return invalid("must be between 3 and 63 characters long");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return invalid("may only contain lowercase letters, digits and hyphens");
    }
    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return invalid("must start and end with a letter or digit");
    }
    if name.contains("--") {
        return invalid("must not contain consecutive hyphens");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(container: &str, folder: &str) -> DatastoreConfig {
        DatastoreConfig::new("account", "c2VjcmV0", container, folder)
    }

    #[test]
    fn test_valid_config() {
        let cfg = config("ipfs-blocks", "node1/").validate().unwrap();
        assert_eq!(cfg.folder_name, "node1");
        assert_eq!(cfg.container_name, "ipfs-blocks");

        let cfg = config("abc", "").validate().unwrap();
        assert_eq!(cfg.folder_name, "");
    }

    #[test]
    fn test_missing_credentials() {
        let mut cfg = config("abc", "");
        cfg.account_name = " ".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(DatastoreError::InvalidConfiguration { .. })
        ));

        let mut cfg = config("abc", "");
        cfg.account_key.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_container_names() {
        assert!(validate_container_name("abc").is_ok());
        assert!(validate_container_name("my-container-01").is_ok());
        assert!(validate_container_name(&"a".repeat(63)).is_ok());

        assert!(validate_container_name("ab").is_err());
        assert!(validate_container_name(&"a".repeat(64)).is_err());
        assert!(validate_container_name("MyContainer").is_err());
        assert!(validate_container_name("-abc").is_err());
        assert!(validate_container_name("abc-").is_err());
        assert!(validate_container_name("a--b").is_err());
        assert!(validate_container_name("a_b_c").is_err());
    }

    #[test]
    fn test_folder_with_leading_slash_rejected() {
        assert!(config("abc", "/root").validate().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", config("abc", ""));
        assert!(!rendered.contains("c2VjcmV0"));
        assert!(rendered.contains("<redacted>"));
    }

    #[cfg(feature = "serde_support")]
    #[test]
    fn test_deserialize_camel_case() {
        let cfg: DatastoreConfig = serde_json::from_str(
            r#"{"accountName":"acct","accountKey":"key","containerName":"blocks"}"#,
        )
        .unwrap();
        assert_eq!(cfg.account_name, "acct");
        assert_eq!(cfg.container_name, "blocks");
        assert_eq!(cfg.folder_name, "");
    }
}
