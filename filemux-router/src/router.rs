// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mount-name routing
//!
//! Routes every operation to the backend mounted under the first segment
//! of the unified path, and rewrites returned paths back into the unified
//! namespace.

use async_trait::async_trait;
use filemux_core::{
    path, File, FileMetadata, FileStorage, ListFilesResponse, ListOptions, Paging, StorageError,
    StorageResult, UpsertFileCommand,
};
use filemux_providers::GuardedStorage;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Outcome of resolving a unified path.
pub struct Resolved {
    pub backend: Arc<dyn FileStorage>,
    /// Path as the backend sees it
    pub local_path: String,
    /// Empty when no mount matched and the fallback backend was chosen
    pub mount_name: String,
}

impl Resolved {
    pub fn is_fallback(&self) -> bool {
        self.mount_name.is_empty()
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("local_path", &self.local_path)
            .field("mount_name", &self.mount_name)
            .finish_non_exhaustive()
    }
}

/// Routes operations to mounted backends.
///
/// The registry is fixed at construction. A path belongs to mount `m` when
/// it is `m`, `/m`, or starts with `/m/`; since mount names cannot contain
/// the delimiter, at most one mount ever matches. Unclaimed paths go to a
/// shared dummy backend that reads as empty and refuses writes.
pub struct Router {
    backends: BTreeMap<String, Arc<dyn FileStorage>>,
    dummy: Arc<dyn FileStorage>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("mounts", &self.mounts())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Build a router from `(mount name, backend)` pairs.
    ///
    /// Fails on an invalid or repeated mount name; nothing is registered
    /// in that case.
    pub fn new<I, S>(mounts: I) -> StorageResult<Self>
    where
        I: IntoIterator<Item = (S, Arc<dyn FileStorage>)>,
        S: Into<String>,
    {
        let mut backends = BTreeMap::new();
        for (name, backend) in mounts {
            let name = name.into();
            path::validate_mount_name(&name)?;
            if backends.contains_key(&name) {
                return Err(StorageError::DuplicateMountName(name));
            }
            backends.insert(name, backend);
        }

        tracing::info!(mounts = backends.len(), "file storage router ready");
        Ok(Self {
            backends,
            dummy: Arc::new(GuardedStorage::dummy()),
        })
    }

    /// A router with no mounts: every path resolves to the dummy backend.
    pub fn disabled() -> Self {
        Self {
            backends: BTreeMap::new(),
            dummy: Arc::new(GuardedStorage::dummy()),
        }
    }

    /// Mount names in resolution order.
    pub fn mounts(&self) -> Vec<&str> {
        self.backends.keys().map(|s| s.as_str()).collect()
    }

    pub fn backend(&self, mount_name: &str) -> Option<Arc<dyn FileStorage>> {
        self.backends.get(mount_name).cloned()
    }

    /// Find the backend serving `path` and the path it should see.
    ///
    /// Validation failures surface as `InvalidPath` before any backend is
    /// touched. An unmatched path is not an error: it resolves to the
    /// dummy backend with an empty mount name and the path unchanged.
    pub fn resolve(&self, path: &str) -> StorageResult<Resolved> {
        for (name, backend) in &self.backends {
            if path::is_under_mount(path, name) {
                let local_path = path::strip_mount_prefix(path, name);
                path::validate_path(&local_path)?;
                return Ok(Resolved {
                    backend: Arc::clone(backend),
                    local_path,
                    mount_name: name.clone(),
                });
            }
        }

        path::validate_path(path)?;
        tracing::warn!(path, "no backend mounted for path");
        Ok(Resolved {
            backend: Arc::clone(&self.dummy),
            local_path: path.to_string(),
            mount_name: String::new(),
        })
    }

    fn rewrite(mount_name: &str, metadata: &mut FileMetadata) {
        let unified = path::join(mount_name, &metadata.full_path);
        metadata.set_full_path(unified);
    }
}

#[async_trait]
impl FileStorage for Router {
    async fn get(&self, path: &str) -> StorageResult<File> {
        let resolved = self.resolve(path)?;
        tracing::debug!(path, mount = %resolved.mount_name, "get");

        let mut file = resolved.backend.get(&resolved.local_path).await?;
        Self::rewrite(&resolved.mount_name, &mut file.metadata);
        Ok(file)
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let resolved = self.resolve(path)?;
        tracing::debug!(path, mount = %resolved.mount_name, "delete");
        resolved.backend.delete(&resolved.local_path).await
    }

    async fn upsert(&self, command: &UpsertFileCommand) -> StorageResult<()> {
        let resolved = self.resolve(&command.path)?;
        tracing::debug!(path = %command.path, mount = %resolved.mount_name, "upsert");

        let local = UpsertFileCommand {
            path: resolved.local_path,
            ..command.clone()
        };
        resolved.backend.upsert(&local).await
    }

    async fn list_files(
        &self,
        path: &str,
        cursor: Option<&Paging>,
        options: &ListOptions,
    ) -> StorageResult<ListFilesResponse> {
        let resolved = self.resolve(path)?;
        tracing::debug!(path, mount = %resolved.mount_name, "list files");

        let mut response = resolved
            .backend
            .list_files(&resolved.local_path, cursor, options)
            .await?;
        for file in &mut response.files {
            Self::rewrite(&resolved.mount_name, &mut file.metadata);
        }
        Ok(response)
    }

    async fn list_folders(&self, path: &str, options: &ListOptions) -> StorageResult<Vec<FileMetadata>> {
        let resolved = self.resolve(path)?;
        tracing::debug!(path, mount = %resolved.mount_name, "list folders");

        let mut folders = resolved
            .backend
            .list_folders(&resolved.local_path, options)
            .await?;
        for folder in &mut folders {
            Self::rewrite(&resolved.mount_name, folder);
        }
        Ok(folders)
    }

    async fn create_folder(&self, path: &str) -> StorageResult<()> {
        let resolved = self.resolve(path)?;
        tracing::debug!(path, mount = %resolved.mount_name, "create folder");
        resolved.backend.create_folder(&resolved.local_path).await
    }

    async fn delete_folder(&self, path: &str) -> StorageResult<()> {
        let resolved = self.resolve(path)?;
        tracing::debug!(path, mount = %resolved.mount_name, "delete folder");
        resolved.backend.delete_folder(&resolved.local_path).await
    }

    /// Close every mounted backend, even after a failure; the last error
    /// wins.
    async fn close(&self) -> StorageResult<()> {
        let mut last_error = None;
        for (name, backend) in &self.backends {
            if let Err(e) = backend.close().await {
                tracing::error!(mount = %name, error = %e, "failed to close backend");
                last_error = Some(e);
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
