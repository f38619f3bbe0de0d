// SPDX-License-Identifier: AGPL-3.0-or-later
//! Storage backends for filemux
//!
//! Every backend speaks backend-local paths only. `GuardedStorage` wraps a
//! backend with its allow-list and supported-operation set; the router
//! mounts guarded backends and keeps one guarded `DummyBackend` as the
//! fallback for paths no mount claims.

mod dummy;
mod guarded;

#[cfg(feature = "local")]
mod local;

#[cfg(feature = "memory")]
mod memory;

pub use dummy::DummyBackend;
pub use guarded::GuardedStorage;

#[cfg(feature = "local")]
pub use local::LocalBackend;

#[cfg(feature = "memory")]
pub use memory::MemoryBackend;

use bytes::Bytes;
use chrono::Utc;
use filemux_core::{
    metadata::{content_hash, DEFAULT_MIME_TYPE},
    path, File, FileMetadata, StorageError, StorageResult, UpsertFileCommand,
};

/// Guess a content type, first from magic bytes, then from the extension.
pub fn sniff_mime_type(file_name: &str, contents: &[u8]) -> String {
    if let Some(kind) = infer::get(contents) {
        return kind.mime_type().to_string();
    }

    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("json") => "application/json",
        Some("txt") | Some("md") => "text/plain",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("svg") => "image/svg+xml",
        Some("yaml") | Some("yml") => "application/yaml",
        _ => DEFAULT_MIME_TYPE,
    }
    .to_string()
}

/// Upserts may only target files, never the root or a folder marker.
pub(crate) fn ensure_file_path(path: &str) -> StorageResult<()> {
    if path::is_root(path) || path.ends_with(path::DELIMITER) {
        return Err(StorageError::InvalidPath(format!(
            "{path}: upsert target must be a file"
        )));
    }
    Ok(())
}

/// Merge an upsert command over whatever is stored at its path.
pub(crate) fn apply_upsert(existing: Option<File>, command: &UpsertFileCommand) -> File {
    let contents: Bytes = command
        .contents
        .clone()
        .or_else(|| existing.as_ref().map(|f| f.contents.clone()))
        .unwrap_or_default();

    let mime_type = command
        .mime_type
        .clone()
        .or_else(|| existing.as_ref().map(|f| f.metadata.mime_type.clone()))
        .unwrap_or_else(|| sniff_mime_type(path::name(&command.path), &contents));

    let properties = command
        .properties
        .clone()
        .or_else(|| existing.as_ref().map(|f| f.metadata.properties.clone()))
        .unwrap_or_default();

    let now = Utc::now();
    let created = existing.as_ref().map(|f| f.metadata.created).unwrap_or(now);

    let mut metadata = FileMetadata::new(command.path.clone())
        .with_size(contents.len() as u64)
        .with_mime_type(mime_type)
        .with_modified(now)
        .with_properties(properties);
    metadata.created = created;
    metadata.content_hash = Some(content_hash(&contents));

    File::new(metadata, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_sniff_by_magic_bytes() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_mime_type("logo.bin", &png), "image/png");
    }

    #[test]
    fn test_sniff_by_extension() {
        assert_eq!(sniff_mime_type("home.json", b"{}"), "application/json");
        assert_eq!(sniff_mime_type("README.MD", b"# hi"), "text/plain");
        assert_eq!(sniff_mime_type("blob", b"??"), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_ensure_file_path() {
        assert!(ensure_file_path("/a.json").is_ok());
        assert!(ensure_file_path("/").is_err());
        assert!(ensure_file_path("/dir/").is_err());
    }

    #[test]
    fn test_apply_upsert_new_file() {
        let cmd = UpsertFileCommand::new("/dash/a.json", "{}");
        let file = apply_upsert(None, &cmd);
        assert_eq!(file.metadata.full_path, "/dash/a.json");
        assert_eq!(file.metadata.name, "a.json");
        assert_eq!(file.metadata.size, 2);
        assert_eq!(file.metadata.mime_type, "application/json");
        assert_eq!(file.metadata.content_hash, Some(content_hash(b"{}")));
    }

    #[test]
    fn test_apply_upsert_keeps_existing_fields() {
        let mut props = HashMap::new();
        props.insert("owner".to_string(), "ops".to_string());
        let first = apply_upsert(
            None,
            &UpsertFileCommand::new("/a.txt", "v1")
                .with_mime_type("text/x-custom")
                .with_properties(props.clone()),
        );

        let update = UpsertFileCommand {
            path: "/a.txt".into(),
            ..Default::default()
        };
        let second = apply_upsert(Some(first.clone()), &update);

        assert_eq!(second.contents, Bytes::from_static(b"v1"));
        assert_eq!(second.metadata.mime_type, "text/x-custom");
        assert_eq!(second.metadata.properties, props);
        assert_eq!(second.metadata.created, first.metadata.created);
    }
}
