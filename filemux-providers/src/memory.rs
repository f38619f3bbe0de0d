// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory backend
//!
//! Used for scratch mounts and testing. All data is lost when dropped.

use async_trait::async_trait;
use filemux_core::{
    entry::paginate,
    path::{self, DELIMITER},
    File, FileMetadata, FileStorage, ListFilesResponse, ListOptions, Paging, StorageError,
    StorageResult, UpsertFileCommand,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::{apply_upsert, ensure_file_path};

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, File>,
    /// Folder paths without a trailing delimiter; the root is implicit.
    folders: BTreeMap<String, FileMetadata>,
}

impl State {
    fn add_ancestors(&mut self, path: &str) {
        let mut current = path::parent(path);
        while !path::is_root(&current) {
            let parent = path::parent(&current);
            self.folders
                .entry(current.clone())
                .or_insert_with(|| FileMetadata::folder(current.clone()));
            current = parent;
        }
    }

    /// First ancestor of `path` that is stored as a file, if any.
    fn file_ancestor(&self, path: &str) -> Option<String> {
        let mut current = path::parent(path);
        while !path::is_root(&current) {
            if self.files.contains_key(&current) {
                return Some(current);
            }
            current = path::parent(&current);
        }
        None
    }

    fn has_children(&self, folder: &str) -> bool {
        self.files.keys().any(|p| path::is_descendant(p, folder))
            || self.folders.keys().any(|p| path::is_descendant(p, folder))
    }
}

/// In-memory backend.
///
/// Thread-safe via an internal `RwLock`; listings come out ordered by path.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_count(&self) -> usize {
        self.state.read().files.len()
    }

    fn folder_key(path: &str) -> String {
        if path::is_root(path) {
            DELIMITER.to_string()
        } else {
            path.trim_end_matches(DELIMITER).to_string()
        }
    }

    fn in_scope(path: &str, folder: &str, recursive: bool) -> bool {
        path::is_descendant(path, folder) && (recursive || path::parent(path) == folder)
    }
}

#[async_trait]
impl FileStorage for MemoryBackend {
    async fn get(&self, path: &str) -> StorageResult<File> {
        self.state
            .read()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        if self.state.write().files.remove(path).is_some() {
            tracing::debug!(path, "deleted file");
        }
        Ok(())
    }

    async fn upsert(&self, command: &UpsertFileCommand) -> StorageResult<()> {
        ensure_file_path(&command.path)?;

        let mut state = self.state.write();
        if state.folders.contains_key(&command.path) {
            return Err(StorageError::AlreadyExists(format!(
                "{}: a folder exists at this path",
                command.path
            )));
        }
        if let Some(file) = state.file_ancestor(&command.path) {
            return Err(StorageError::NotAFolder(file));
        }

        let existing = state.files.remove(&command.path);
        let file = apply_upsert(existing, command);
        state.add_ancestors(&command.path);
        state.files.insert(command.path.clone(), file);
        Ok(())
    }

    async fn list_files(
        &self,
        path: &str,
        cursor: Option<&Paging>,
        options: &ListOptions,
    ) -> StorageResult<ListFilesResponse> {
        let folder = Self::folder_key(path);
        let state = self.state.read();

        let files: Vec<File> = state
            .files
            .iter()
            .filter(|(p, _)| Self::in_scope(p, &folder, options.recursive))
            .filter(|(p, _)| options.filters.as_ref().map_or(true, |f| f.is_allowed(p)))
            .map(|(_, file)| {
                if options.with_contents {
                    file.clone()
                } else {
                    file.without_contents()
                }
            })
            .collect();

        Ok(paginate(files, cursor))
    }

    async fn list_folders(&self, path: &str, options: &ListOptions) -> StorageResult<Vec<FileMetadata>> {
        let folder = Self::folder_key(path);
        let state = self.state.read();

        Ok(state
            .folders
            .iter()
            .filter(|(p, _)| Self::in_scope(p, &folder, options.recursive))
            .filter(|(p, _)| options.filters.as_ref().map_or(true, |f| f.is_allowed(p)))
            .map(|(_, meta)| meta.clone())
            .collect())
    }

    async fn create_folder(&self, path: &str) -> StorageResult<()> {
        let folder = Self::folder_key(path);
        if path::is_root(&folder) {
            return Ok(());
        }

        let mut state = self.state.write();
        if state.files.contains_key(&folder) {
            return Err(StorageError::NotAFolder(folder));
        }
        if let Some(file) = state.file_ancestor(&folder) {
            return Err(StorageError::NotAFolder(file));
        }
        state.add_ancestors(&folder);
        state
            .folders
            .entry(folder.clone())
            .or_insert_with(|| FileMetadata::folder(folder.clone()));
        Ok(())
    }

    async fn delete_folder(&self, path: &str) -> StorageResult<()> {
        let folder = Self::folder_key(path);
        if path::is_root(&folder) {
            return Err(StorageError::InvalidPath("cannot delete the root folder".into()));
        }

        let mut state = self.state.write();
        if state.files.contains_key(&folder) {
            return Err(StorageError::NotAFolder(folder));
        }
        if state.has_children(&folder) {
            return Err(StorageError::FolderNotEmpty(folder));
        }
        state.folders.remove(&folder);
        Ok(())
    }
}
