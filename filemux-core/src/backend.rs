// SPDX-License-Identifier: AGPL-3.0-or-later
//! Storage backend trait

use async_trait::async_trait;

use crate::{
    entry::{File, ListFilesResponse},
    error::StorageResult,
    metadata::FileMetadata,
    operations::{ListOptions, Paging, UpsertFileCommand},
};

/// The capability set every backend offers.
///
/// Paths handed to a backend are backend-local (`/dir/file.json`); the
/// backend never sees or produces mount names. Cancellation is the
/// caller's: dropping the returned future abandons the call.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Fetch one file with its contents. Missing files are `NotFound`.
    async fn get(&self, path: &str) -> StorageResult<File>;

    /// Remove one file. Removing a missing file is not an error.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Create or overwrite `command.path`.
    async fn upsert(&self, command: &UpsertFileCommand) -> StorageResult<()>;

    /// Files under `path`, ordered by full path. `cursor` is interpreted
    /// by the backend alone.
    async fn list_files(
        &self,
        path: &str,
        cursor: Option<&Paging>,
        options: &ListOptions,
    ) -> StorageResult<ListFilesResponse>;

    async fn list_folders(&self, path: &str, options: &ListOptions) -> StorageResult<Vec<FileMetadata>>;

    /// Create a folder and any missing parents. Idempotent.
    async fn create_folder(&self, path: &str) -> StorageResult<()>;

    /// Remove an empty folder. Removing a missing folder is not an error.
    async fn delete_folder(&self, path: &str) -> StorageResult<()>;

    /// Release resources. Called once at shutdown.
    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
