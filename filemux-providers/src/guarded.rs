// SPDX-License-Identifier: AGPL-3.0-or-later
//! Allow-list and supported-operation enforcement around a backend

use async_trait::async_trait;
use filemux_core::{
    entry::paginate,
    path::{self, DELIMITER},
    File, FileMetadata, FileStorage, ListFilesResponse, ListOptions, Operation, Paging,
    PathFilters, StorageError, StorageResult, UpsertFileCommand,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::DummyBackend;

/// Wraps a backend so it only performs what its configuration allows.
///
/// Refused reads look like misses (not-found, empty listings); refused
/// mutations fail with `Unsupported` when the operation is switched off
/// and `PermissionDenied` when the path is filtered out.
pub struct GuardedStorage {
    name: String,
    inner: Arc<dyn FileStorage>,
    filters: PathFilters,
    supported: HashSet<Operation>,
}

impl std::fmt::Debug for GuardedStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedStorage")
            .field("name", &self.name)
            .field("filters", &self.filters)
            .field("supported", &self.supported)
            .finish_non_exhaustive()
    }
}

impl GuardedStorage {
    pub fn new(
        name: impl Into<String>,
        inner: Arc<dyn FileStorage>,
        filters: PathFilters,
        supported: impl IntoIterator<Item = Operation>,
    ) -> Self {
        Self {
            name: name.into(),
            inner,
            filters,
            supported: supported.into_iter().collect(),
        }
    }

    /// Every operation allowed, no path filtering.
    pub fn unrestricted(name: impl Into<String>, inner: Arc<dyn FileStorage>) -> Self {
        Self::new(name, inner, PathFilters::allow_all(), Operation::ALL)
    }

    /// The fallback for unmounted paths: denies every path and supports
    /// no operation.
    pub fn dummy() -> Self {
        Self::new("dummy", Arc::new(DummyBackend), PathFilters::deny_all(), Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filters(&self) -> &PathFilters {
        &self.filters
    }

    pub fn supports(&self, operation: Operation) -> bool {
        self.supported.contains(&operation)
    }

    fn folder_allowed(&self, folder: &str) -> bool {
        if self.filters.is_allowed(folder) {
            return true;
        }
        let trimmed = folder.trim_end_matches(DELIMITER);
        self.filters.is_allowed(&format!("{trimmed}{DELIMITER}"))
    }

    /// Gate a single-path operation; `Ok(false)` means a silent miss.
    fn admit(&self, operation: Operation, target: &str, folder: bool) -> StorageResult<bool> {
        path::validate_path(target)?;

        if !self.supports(operation) {
            tracing::warn!(backend = %self.name, %operation, path = %target, "operation not supported");
            return if operation.is_read() {
                Ok(false)
            } else {
                Err(StorageError::unsupported(operation, target))
            };
        }

        let allowed = if folder {
            self.folder_allowed(target)
        } else {
            self.filters.is_allowed(target)
        };
        if !allowed {
            tracing::warn!(backend = %self.name, %operation, path = %target, "path not allowed");
            return if operation.is_read() {
                Ok(false)
            } else {
                Err(StorageError::PermissionDenied(target.to_string()))
            };
        }
        Ok(true)
    }
}

#[async_trait]
impl FileStorage for GuardedStorage {
    async fn get(&self, path: &str) -> StorageResult<File> {
        if !self.admit(Operation::Get, path, false)? {
            return Err(StorageError::NotFound(path.to_string()));
        }
        self.inner.get(path).await
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.admit(Operation::Delete, path, false)?;
        self.inner.delete(path).await
    }

    async fn upsert(&self, command: &UpsertFileCommand) -> StorageResult<()> {
        self.admit(Operation::Upsert, &command.path, false)?;
        self.inner.upsert(command).await
    }

    async fn list_files(
        &self,
        path: &str,
        cursor: Option<&Paging>,
        options: &ListOptions,
    ) -> StorageResult<ListFilesResponse> {
        path::validate_path(path)?;
        if !self.supports(Operation::ListFiles) || self.filters.is_deny_all() {
            return Ok(ListFilesResponse::default());
        }

        // Page only after filtering so the cursor never lands on a denied path.
        let unbounded = cursor.map(|c| Paging {
            after: c.after.clone(),
            first: 0,
        });
        let mut files = self
            .inner
            .list_files(path, unbounded.as_ref(), options)
            .await?
            .files;
        files.retain(|f| self.filters.is_allowed(f.full_path()));

        let page = cursor.map(|c| Paging::first(c.first));
        Ok(paginate(files, page.as_ref()))
    }

    async fn list_folders(&self, path: &str, options: &ListOptions) -> StorageResult<Vec<FileMetadata>> {
        path::validate_path(path)?;
        if !self.supports(Operation::ListFolders) || self.filters.is_deny_all() {
            return Ok(Vec::new());
        }

        let mut folders = self.inner.list_folders(path, options).await?;
        folders.retain(|f| self.folder_allowed(&f.full_path));
        Ok(folders)
    }

    async fn create_folder(&self, path: &str) -> StorageResult<()> {
        self.admit(Operation::CreateFolder, path, true)?;
        self.inner.create_folder(path).await
    }

    async fn delete_folder(&self, path: &str) -> StorageResult<()> {
        self.admit(Operation::DeleteFolder, path, true)?;
        self.inner.delete_folder(path).await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    async fn seeded() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .upsert(&UpsertFileCommand::new("/dashboards/a.json", "{}"))
            .await
            .unwrap();
        backend
            .upsert(&UpsertFileCommand::new("/secrets/key", "hunter2"))
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_dummy_reads_miss_and_mutations_fail() {
        let dummy = GuardedStorage::dummy();
        assert!(dummy.get("/x").await.unwrap_err().is_not_found());
        assert!(dummy
            .upsert(&UpsertFileCommand::new("/x", "y"))
            .await
            .unwrap_err()
            .is_unsupported());
        assert!(dummy.delete("/x").await.unwrap_err().is_unsupported());
        assert!(dummy
            .list_files("/", None, &ListOptions::default())
            .await
            .unwrap()
            .files
            .is_empty());
    }

    #[tokio::test]
    async fn test_invalid_path_rejected_before_backend() {
        let guarded = GuardedStorage::unrestricted("mem", seeded().await);
        assert!(guarded.get("/../etc/passwd").await.unwrap_err().is_invalid_path());
        assert!(guarded
            .list_files("/a/../b", None, &ListOptions::default())
            .await
            .unwrap_err()
            .is_invalid_path());
    }

    #[tokio::test]
    async fn test_filtered_get_is_not_found() {
        let filters = PathFilters::new(Some(vec!["/dashboards/".into()]));
        let guarded = GuardedStorage::new("mem", seeded().await, filters, Operation::ALL);

        assert!(guarded.get("/dashboards/a.json").await.is_ok());
        assert!(guarded.get("/secrets/key").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_filtered_mutation_is_denied() {
        let filters = PathFilters::new(Some(vec!["/dashboards/".into()]));
        let guarded = GuardedStorage::new("mem", seeded().await, filters, Operation::ALL);

        let err = guarded
            .upsert(&UpsertFileCommand::new("/secrets/new", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PermissionDenied(_)));
        assert!(guarded.create_folder("/dashboards").await.is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_operations() {
        let guarded = GuardedStorage::new(
            "ro",
            seeded().await,
            PathFilters::allow_all(),
            [Operation::Get, Operation::ListFiles],
        );

        assert!(guarded.get("/dashboards/a.json").await.is_ok());
        assert!(guarded.delete("/dashboards/a.json").await.unwrap_err().is_unsupported());
        assert!(guarded
            .list_folders("/", &ListOptions::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_listing_drops_filtered_entries() {
        let filters = PathFilters::new(Some(vec!["/dashboards/".into()]));
        let guarded = GuardedStorage::new("mem", seeded().await, filters, Operation::ALL);

        let listing = guarded
            .list_files("/", None, &ListOptions::recursive())
            .await
            .unwrap();
        let paths: Vec<_> = listing.files.iter().map(|f| f.full_path()).collect();
        assert_eq!(paths, vec!["/dashboards/a.json"]);

        let folders = guarded
            .list_folders("/", &ListOptions::default())
            .await
            .unwrap();
        let names: Vec<_> = folders.iter().map(|f| f.full_path.as_str()).collect();
        assert_eq!(names, vec!["/dashboards"]);
    }

    #[tokio::test]
    async fn test_paged_listing_skips_filtered_entries() {
        let backend = Arc::new(MemoryBackend::new());
        for p in ["/a-secret", "/b-secret", "/dashboards/x.json", "/dashboards/y.json"] {
            backend.upsert(&UpsertFileCommand::new(p, "{}")).await.unwrap();
        }
        let filters = PathFilters::new(Some(vec!["/dashboards/".into()]));
        let guarded = GuardedStorage::new("mem", backend, filters, Operation::ALL);

        let first = guarded
            .list_files("/", Some(&Paging::first(1)), &ListOptions::recursive())
            .await
            .unwrap();
        let paths: Vec<_> = first.files.iter().map(|f| f.full_path()).collect();
        assert_eq!(paths, vec!["/dashboards/x.json"]);
        assert!(first.has_more);
        assert_eq!(first.last_path.as_deref(), Some("/dashboards/x.json"));

        let cursor = Paging::first(1).after(first.last_path.unwrap());
        let second = guarded
            .list_files("/", Some(&cursor), &ListOptions::recursive())
            .await
            .unwrap();
        let paths: Vec<_> = second.files.iter().map(|f| f.full_path()).collect();
        assert_eq!(paths, vec!["/dashboards/y.json"]);
        assert!(!second.has_more);

        let everything = guarded
            .list_files("/", Some(&Paging::first(10)), &ListOptions::recursive())
            .await
            .unwrap();
        assert!(everything.files.iter().all(|f| !f.full_path().contains("secret")));
        assert!(!everything.has_more);
    }
}
