// SPDX-License-Identifier: AGPL-3.0-or-later
//! Local filesystem backend
//!
//! Files live under a root directory; each file's content type, creation
//! time, hash, and properties sit next to it in a `<name>.attrs` JSON
//! sidecar. Folders are real directories.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use filemux_core::{
    entry::paginate,
    metadata::content_hash,
    path::{self, DELIMITER},
    File, FileMetadata, FileStorage, ListFilesResponse, ListOptions, Paging, StorageError,
    StorageResult, UpsertFileCommand,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use crate::{apply_upsert, ensure_file_path, sniff_mime_type};

/// Suffix of the metadata sidecar stored next to every file
pub const ATTRS_SUFFIX: &str = ".attrs";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAttrs {
    mime_type: String,
    created: DateTime<Utc>,
    content_hash: Option<String>,
    #[serde(default)]
    properties: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkKind {
    Files,
    Folders,
}

/// Local filesystem backend
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Open a backend rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        let meta = fs::metadata(&root).await?;
        if !meta.is_dir() {
            return Err(StorageError::NotAFolder(root.display().to_string()));
        }
        tracing::debug!(root = %root.display(), "opened local backend");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn to_real_path(&self, path: &str) -> StorageResult<PathBuf> {
        path::validate_path(path)?;
        let mut real = self.root.clone();
        for segment in path.split(DELIMITER).filter(|s| !s.is_empty()) {
            real.push(segment);
        }
        Ok(real)
    }

    fn is_sidecar(path: &str) -> bool {
        path.trim_end_matches(DELIMITER).ends_with(ATTRS_SUFFIX)
    }

    /// Sidecar names are never addressable through the backend.
    fn reject_sidecar(path: &str) -> StorageResult<()> {
        if Self::is_sidecar(path) {
            return Err(StorageError::InvalidPath(format!(
                "{path}: {ATTRS_SUFFIX} names are reserved"
            )));
        }
        Ok(())
    }

    /// First ancestor of `path` that exists as a regular file, if any.
    async fn file_ancestor(&self, path: &str) -> StorageResult<Option<String>> {
        let mut current = path::parent(path);
        while !path::is_root(&current) {
            let real = self.to_real_path(&current)?;
            if fs::metadata(&real).await.map(|m| m.is_file()).unwrap_or(false) {
                return Ok(Some(current));
            }
            current = path::parent(&current);
        }
        Ok(None)
    }

    fn to_local_path(root: &Path, real: &Path) -> StorageResult<String> {
        let relative = real
            .strip_prefix(root)
            .map_err(|_| StorageError::InvalidPath(real.display().to_string()))?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(format!("{DELIMITER}{}", segments.join(DELIMITER)))
    }

    fn attrs_path(real: &Path) -> PathBuf {
        let mut name = real.as_os_str().to_owned();
        name.push(ATTRS_SUFFIX);
        PathBuf::from(name)
    }

    async fn read_attrs(real: &Path) -> StorageResult<Option<StoredAttrs>> {
        match fs::read(Self::attrs_path(real)).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self, local: &str, real: &Path, with_contents: bool) -> StorageResult<File> {
        let meta = match fs::metadata(real).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(StorageError::NotFound(local.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(local.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let contents = if with_contents {
            Bytes::from(fs::read(real).await?)
        } else {
            Bytes::new()
        };
        let attrs = Self::read_attrs(real).await?;

        let mut metadata = FileMetadata::new(local).with_size(meta.len());
        if let Ok(modified) = meta.modified() {
            metadata.modified = modified.into();
        }
        match attrs {
            Some(attrs) => {
                metadata.mime_type = attrs.mime_type;
                metadata.created = attrs.created;
                metadata.content_hash = attrs.content_hash;
                metadata.properties = attrs.properties;
            }
            None => {
                metadata.mime_type = sniff_mime_type(&metadata.name, &contents);
                if let Ok(created) = meta.created() {
                    metadata.created = created.into();
                }
                if with_contents {
                    metadata.content_hash = Some(content_hash(&contents));
                }
            }
        }

        Ok(File::new(metadata, contents))
    }

    /// Walk below `real` off the async runtime, returning sorted real paths.
    async fn walk(&self, real: PathBuf, recursive: bool, kind: WalkKind) -> StorageResult<Vec<PathBuf>> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        tokio::task::spawn_blocking(move || {
            let mut found = Vec::new();
            for entry in WalkDir::new(&real)
                .min_depth(1)
                .max_depth(max_depth)
                .sort_by_file_name()
            {
                let entry = entry.map_err(|e| StorageError::Other(e.to_string()))?;
                let is_dir = entry.file_type().is_dir();
                let keep = match kind {
                    WalkKind::Folders => is_dir,
                    WalkKind::Files => {
                        entry.file_type().is_file()
                            && !entry.file_name().to_string_lossy().ends_with(ATTRS_SUFFIX)
                    }
                };
                if keep {
                    found.push(entry.into_path());
                }
            }
            Ok::<_, StorageError>(found)
        })
        .await
        .map_err(|e| StorageError::Other(format!("directory walk failed: {e}")))?
    }

    async fn is_dir(real: &Path) -> bool {
        fs::metadata(real).await.map(|m| m.is_dir()).unwrap_or(false)
    }
}

#[async_trait]
impl FileStorage for LocalBackend {
    async fn get(&self, path: &str) -> StorageResult<File> {
        let real = self.to_real_path(path)?;
        if Self::is_sidecar(path) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        self.load(path, &real, true).await
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let real = self.to_real_path(path)?;
        Self::reject_sidecar(path)?;
        match fs::metadata(&real).await {
            Ok(meta) if meta.is_file() => {
                fs::remove_file(&real).await?;
                if let Err(e) = fs::remove_file(Self::attrs_path(&real)).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        return Err(e.into());
                    }
                }
                tracing::debug!(path, "deleted file");
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert(&self, command: &UpsertFileCommand) -> StorageResult<()> {
        ensure_file_path(&command.path)?;
        let real = self.to_real_path(&command.path)?;
        Self::reject_sidecar(&command.path)?;
        if Self::is_dir(&real).await {
            return Err(StorageError::AlreadyExists(format!(
                "{}: a folder exists at this path",
                command.path
            )));
        }
        if let Some(file) = self.file_ancestor(&command.path).await? {
            return Err(StorageError::NotAFolder(file));
        }

        let existing = match self.load(&command.path, &real, true).await {
            Ok(file) => Some(file),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        let file = apply_upsert(existing, command);

        if let Some(parent) = real.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&real, &file.contents).await?;

        let attrs = StoredAttrs {
            mime_type: file.metadata.mime_type,
            created: file.metadata.created,
            content_hash: file.metadata.content_hash,
            properties: file.metadata.properties,
        };
        fs::write(Self::attrs_path(&real), serde_json::to_vec_pretty(&attrs)?).await?;
        Ok(())
    }

    async fn list_files(
        &self,
        path: &str,
        cursor: Option<&Paging>,
        options: &ListOptions,
    ) -> StorageResult<ListFilesResponse> {
        let real = self.to_real_path(path)?;
        if !Self::is_dir(&real).await {
            return Ok(ListFilesResponse::default());
        }

        let mut locals = Vec::new();
        for entry in self.walk(real, options.recursive, WalkKind::Files).await? {
            let local = Self::to_local_path(&self.root, &entry)?;
            if options.filters.as_ref().map_or(true, |f| f.is_allowed(&local)) {
                locals.push((local, entry));
            }
        }
        locals.sort_by(|a, b| a.0.cmp(&b.0));

        let mut files = Vec::with_capacity(locals.len());
        for (local, entry) in locals {
            files.push(self.load(&local, &entry, options.with_contents).await?);
        }
        Ok(paginate(files, cursor))
    }

    async fn list_folders(&self, path: &str, options: &ListOptions) -> StorageResult<Vec<FileMetadata>> {
        let real = self.to_real_path(path)?;
        if !Self::is_dir(&real).await {
            return Ok(Vec::new());
        }

        let mut folders = Vec::new();
        for entry in self.walk(real, options.recursive, WalkKind::Folders).await? {
            let local = Self::to_local_path(&self.root, &entry)?;
            if !options.filters.as_ref().map_or(true, |f| f.is_allowed(&local)) {
                continue;
            }
            let mut folder = FileMetadata::folder(local);
            if let Ok(modified) = fs::metadata(&entry).await.and_then(|m| m.modified()) {
                folder.modified = modified.into();
            }
            folders.push(folder);
        }
        folders.sort_by(|a, b| a.full_path.cmp(&b.full_path));
        Ok(folders)
    }

    async fn create_folder(&self, path: &str) -> StorageResult<()> {
        let real = self.to_real_path(path)?;
        Self::reject_sidecar(path)?;
        if let Ok(meta) = fs::metadata(&real).await {
            if !meta.is_dir() {
                return Err(StorageError::NotAFolder(path.to_string()));
            }
            return Ok(());
        }
        if let Some(file) = self.file_ancestor(path).await? {
            return Err(StorageError::NotAFolder(file));
        }
        fs::create_dir_all(&real).await?;
        Ok(())
    }

    async fn delete_folder(&self, path: &str) -> StorageResult<()> {
        if path::is_root(path) {
            return Err(StorageError::InvalidPath("cannot delete the root folder".into()));
        }
        let real = self.to_real_path(path)?;
        Self::reject_sidecar(path)?;
        let meta = match fs::metadata(&real).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if !meta.is_dir() {
            return Err(StorageError::NotAFolder(path.to_string()));
        }

        let mut read_dir = fs::read_dir(&real).await?;
        if read_dir.next_entry().await?.is_some() {
            return Err(StorageError::FolderNotEmpty(path.to_string()));
        }
        fs::remove_dir(&real).await?;
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        tracing::debug!(root = %self.root.display(), "closing local backend");
        Ok(())
    }
}
