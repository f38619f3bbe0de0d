// SPDX-License-Identifier: AGPL-3.0-or-later
//! File and folder metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::path;

/// Fallback content type when neither the caller nor the content says otherwise
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Content type reported for folders
pub const FOLDER_MIME_TYPE: &str = "directory";

/// File/folder metadata
///
/// `full_path` is backend-local while inside a backend and unified once the
/// router hands it back to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub full_path: String,
    pub mime_type: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// BLAKE3 hex digest of the contents
    pub content_hash: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl FileMetadata {
    pub fn new(full_path: impl Into<String>) -> Self {
        let full_path = full_path.into();
        let now = Utc::now();
        Self {
            name: path::name(&full_path).to_string(),
            full_path,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            size: 0,
            created: now,
            modified: now,
            content_hash: None,
            properties: HashMap::new(),
        }
    }

    pub fn folder(full_path: impl Into<String>) -> Self {
        Self {
            mime_type: FOLDER_MIME_TYPE.to_string(),
            ..Self::new(full_path)
        }
    }

    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = modified;
        self
    }

    pub fn with_properties(mut self, properties: HashMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Rewrite the path, keeping `name` in step with it.
    pub fn set_full_path(&mut self, full_path: String) {
        self.name = path::name(&full_path).to_string();
        self.full_path = full_path;
    }
}

/// BLAKE3 hex digest used for `content_hash`
pub fn content_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_name() {
        let meta = FileMetadata::new("/dashboards/home.json");
        assert_eq!(meta.name, "home.json");
        assert_eq!(meta.mime_type, DEFAULT_MIME_TYPE);
        assert!(!meta.is_folder());
    }

    #[test]
    fn test_folder() {
        let meta = FileMetadata::folder("/dashboards/");
        assert_eq!(meta.name, "dashboards");
        assert!(meta.is_folder());
    }

    #[test]
    fn test_set_full_path_updates_name() {
        let mut meta = FileMetadata::new("/a.json");
        meta.set_full_path("/public/b.json".into());
        assert_eq!(meta.full_path, "/public/b.json");
        assert_eq!(meta.name, "b.json");
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash(b"hello"), content_hash(b"hello"));
        assert_ne!(content_hash(b"hello"), content_hash(b"world"));
        assert_eq!(content_hash(b"").len(), 64);
    }
}
