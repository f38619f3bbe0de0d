// SPDX-License-Identifier: AGPL-3.0-or-later
//! Backend for paths that belong to no mount

use async_trait::async_trait;
use filemux_core::{
    File, FileMetadata, FileStorage, ListFilesResponse, ListOptions, Operation, Paging,
    StorageError, StorageResult, UpsertFileCommand,
};

/// Stores nothing: reads miss and every mutation is unsupported.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyBackend;

#[async_trait]
impl FileStorage for DummyBackend {
    async fn get(&self, path: &str) -> StorageResult<File> {
        Err(StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        Err(StorageError::unsupported(Operation::Delete, path))
    }

    async fn upsert(&self, command: &UpsertFileCommand) -> StorageResult<()> {
        Err(StorageError::unsupported(Operation::Upsert, &command.path))
    }

    async fn list_files(
        &self,
        _path: &str,
        _cursor: Option<&Paging>,
        _options: &ListOptions,
    ) -> StorageResult<ListFilesResponse> {
        Ok(ListFilesResponse::default())
    }

    async fn list_folders(&self, _path: &str, _options: &ListOptions) -> StorageResult<Vec<FileMetadata>> {
        Ok(Vec::new())
    }

    async fn create_folder(&self, path: &str) -> StorageResult<()> {
        Err(StorageError::unsupported(Operation::CreateFolder, path))
    }

    async fn delete_folder(&self, path: &str) -> StorageResult<()> {
        Err(StorageError::unsupported(Operation::DeleteFolder, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_miss() {
        let dummy = DummyBackend;
        assert!(dummy.get("/a.json").await.unwrap_err().is_not_found());
        let listing = dummy
            .list_files("/", None, &ListOptions::default())
            .await
            .unwrap();
        assert!(listing.files.is_empty());
        assert!(!listing.has_more);
        assert!(dummy
            .list_folders("/", &ListOptions::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_mutations_unsupported() {
        let dummy = DummyBackend;
        assert!(dummy.delete("/a").await.unwrap_err().is_unsupported());
        assert!(dummy
            .upsert(&UpsertFileCommand::new("/a", "x"))
            .await
            .unwrap_err()
            .is_unsupported());
        assert!(dummy.create_folder("/d").await.unwrap_err().is_unsupported());
        assert!(dummy.delete_folder("/d").await.unwrap_err().is_unsupported());
    }
}
