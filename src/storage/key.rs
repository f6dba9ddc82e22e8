//! Logical keys and their mapping onto remote object paths
//!
//! A [`Key`] is the caller-facing, hierarchical identifier (`/blocks/CIQA...`).
//! A [`KeyMapper`] turns it into the [`ObjectPath`] used inside the container.
//! Every datastore operation goes through the same mapper, so put, get, has,
//! size and delete always agree on the object they address.

use std::fmt;

/// Hierarchical logical key, always rooted at `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// Build a key from an arbitrary path-like string.
    ///
    /// The string is cleaned: it gains a leading `/`, empty and `.` segments
    /// are dropped, `..` removes the previous segment and a trailing `/` is
    /// removed. `Key::new("a//b/")` and `Key::new("/a/b")` are the same key.
    pub fn new(s: impl AsRef<str>) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for segment in s.as_ref().split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        Self(format!("/{}", segments.join("/")))
    }

    /// Wrap a string that is already a clean key, without re-cleaning it.
    ///
    /// Used for keys read back from storage. A missing leading `/` is still
    /// added.
    pub fn from_raw(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.starts_with('/') {
            Self(s)
        } else {
            Self(format!("/{s}"))
        }
    }

    /// The root key `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// String form of the key, including the leading `/`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key body without the leading `/`, the form used as an object name
    pub(crate) fn as_segment(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::new(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::new(s)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Location of an object inside its container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Path string as sent to the object client
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the path and return the owned string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maps logical keys to object paths below an optional folder prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMapper {
    folder: String,
}

impl KeyMapper {
    /// Create a mapper for the given folder prefix.
    ///
    /// Surrounding `/` characters are trimmed; an empty folder places objects
    /// at the container root.
    pub fn new(folder: impl AsRef<str>) -> Self {
        Self {
            folder: folder.as_ref().trim_matches('/').to_string(),
        }
    }

    /// Folder prefix, without separators
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Object path for `key`: `folder/key-body`, or `key-body` with no folder.
    ///
    /// The key bytes are copied verbatim. Escaping for the wire is left to
    /// the driver so it happens exactly once.
    pub fn object_path(&self, key: &Key) -> ObjectPath {
        let segment = key.as_segment();
        if self.folder.is_empty() {
            ObjectPath(segment.to_string())
        } else {
            ObjectPath(format!("{}/{}", self.folder, segment))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_cleaning() {
        assert_eq!(Key::new("a/b").as_str(), "/a/b");
        assert_eq!(Key::new("/a//b/").as_str(), "/a/b");
        assert_eq!(Key::new("/a/./b/../c").as_str(), "/a/c");
        assert_eq!(Key::new("").as_str(), "/");
        assert_eq!(Key::new("/../..").as_str(), "/");
        assert_eq!(Key::new("/CIQA4T3TD3BP3C2M"), Key::from("CIQA4T3TD3BP3C2M"));
    }

    #[test]
    fn test_key_does_not_fold_case() {
        assert_ne!(Key::new("/Blocks/ABC"), Key::new("/blocks/abc"));
        assert_eq!(Key::new("/Blocks/ABC").as_str(), "/Blocks/ABC");
    }

    #[test]
    fn test_root_key() {
        assert_eq!(Key::root(), Key::new("/"));
        assert_eq!(KeyMapper::new("ipfs").object_path(&Key::root()).as_str(), "ipfs/");
    }

    #[test]
    fn test_from_raw_keeps_content() {
        assert_eq!(Key::from_raw("/a//b").as_str(), "/a//b");
        assert_eq!(Key::from_raw("a").as_str(), "/a");
    }

    #[test]
    fn test_object_path_with_folder() {
        let mapper = KeyMapper::new("ipfs");
        assert_eq!(mapper.object_path(&Key::new("/blocks/ABC")).as_str(), "ipfs/blocks/ABC");

        let mapper = KeyMapper::new("/ipfs/node-1/");
        assert_eq!(mapper.folder(), "ipfs/node-1");
        assert_eq!(mapper.object_path(&Key::new("/x")).as_str(), "ipfs/node-1/x");
    }

    #[test]
    fn test_object_path_without_folder() {
        let mapper = KeyMapper::new("");
        assert_eq!(mapper.object_path(&Key::new("/blocks/ABC")).as_str(), "blocks/ABC");
        assert_eq!(mapper.object_path(&Key::new("x")).as_str(), "x");
    }

    #[test]
    fn test_object_path_is_verbatim() {
        let mapper = KeyMapper::new("f");
        let key = Key::new("/with space/ü/%20");
        assert_eq!(mapper.object_path(&key).as_str(), "f/with space/ü/%20");
    }
}
