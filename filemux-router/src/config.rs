// SPDX-License-Identifier: AGPL-3.0-or-later
//! Router configuration
//!
//! ```toml
//! enabled = true
//!
//! [[backends.fs]]
//! name = "public"
//! path = "/var/lib/filemux/public"
//! allowed_prefixes = ["/dashboards/"]
//! allowed_paths = ["/README.md"]
//! disallowed_paths = ["/dashboards/draft.json"]
//! supported_operations = ["get", "list-files", "list-folders"]
//!
//! [[backends.memory]]
//! name = "scratch"
//! ```

use filemux_core::{path, FileStorage, Operation, PathFilters, StorageError, StorageResult};
use filemux_providers::{GuardedStorage, LocalBackend, MemoryBackend};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Router;

/// Top-level storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Feature gate; when off the router has no mounts at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub backends: BackendsConfig,
}

fn default_enabled() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backends: BackendsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default)]
    pub fs: Vec<FsBackendConfig>,
    #[serde(default)]
    pub memory: Vec<MemoryBackendConfig>,
    #[serde(default)]
    pub db: Vec<DbBackendConfig>,
}

/// What a mount may do, shared by every backend kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Omitted allows every path; an empty list allows none
    #[serde(default)]
    pub allowed_prefixes: Option<Vec<String>>,
    #[serde(default)]
    pub disallowed_prefixes: Vec<String>,
    /// Exact paths let through even when no prefix matches
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    #[serde(default)]
    pub disallowed_paths: Vec<String>,
    /// Omitted enables every operation
    #[serde(default)]
    pub supported_operations: Option<Vec<Operation>>,
}

impl AccessConfig {
    pub fn filters(&self) -> PathFilters {
        PathFilters::new(self.allowed_prefixes.clone())
            .with_disallowed_prefixes(self.disallowed_prefixes.clone())
            .with_allowed_paths(self.allowed_paths.clone())
            .with_disallowed_paths(self.disallowed_paths.clone())
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.supported_operations
            .clone()
            .unwrap_or_else(|| Operation::ALL.to_vec())
    }

    fn guard(&self, name: &str, backend: Arc<dyn FileStorage>) -> Arc<dyn FileStorage> {
        Arc::new(GuardedStorage::new(
            name,
            backend,
            self.filters(),
            self.operations(),
        ))
    }
}

/// A mount backed by a local directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsBackendConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub access: AccessConfig,
}

/// A mount held in memory for the life of the process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBackendConfig {
    pub name: String,
    #[serde(flatten)]
    pub access: AccessConfig,
}

/// Reserved for a database-backed mount; not constructible yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbBackendConfig {
    pub name: String,
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(flatten)]
    pub access: AccessConfig,
}

impl StorageConfig {
    pub fn from_toml_str(raw: &str) -> StorageResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            StorageError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Every configured mount name, in declaration order
    pub fn mount_names(&self) -> Vec<&str> {
        self.backends
            .fs
            .iter()
            .map(|b| b.name.as_str())
            .chain(self.backends.memory.iter().map(|b| b.name.as_str()))
            .chain(self.backends.db.iter().map(|b| b.name.as_str()))
            .collect()
    }

    /// Reject bad or repeated names before any backend is opened.
    pub fn validate(&self) -> StorageResult<()> {
        let mut seen = HashSet::new();
        for name in self.mount_names() {
            path::validate_mount_name(name)?;
            if !seen.insert(name) {
                return Err(StorageError::DuplicateMountName(name.to_string()));
            }
        }
        Ok(())
    }
}

impl Router {
    /// Build a router from configuration.
    ///
    /// Any backend that fails to initialize aborts construction; there is
    /// no partially populated router.
    pub async fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        if !config.enabled {
            tracing::info!("file storage disabled");
            return Ok(Self::disabled());
        }
        config.validate()?;

        if let Some(db) = config.backends.db.first() {
            return Err(StorageError::Config(format!(
                "database-backed storage is not available yet (mount {:?})",
                db.name
            )));
        }

        let mut mounts: Vec<(String, Arc<dyn FileStorage>)> = Vec::new();

        for fs in &config.backends.fs {
            let backend = LocalBackend::open(&fs.path).await.map_err(|e| {
                tracing::error!(mount = %fs.name, path = %fs.path.display(), error = %e, "failed to open local backend");
                e
            })?;
            mounts.push((fs.name.clone(), fs.access.guard(&fs.name, Arc::new(backend))));
        }

        for mem in &config.backends.memory {
            mounts.push((
                mem.name.clone(),
                mem.access.guard(&mem.name, Arc::new(MemoryBackend::new())),
            ));
        }

        Router::new(mounts)
    }
}
