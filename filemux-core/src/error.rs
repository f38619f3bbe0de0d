// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for filemux

use crate::operations::Operation;
use thiserror::Error;

/// Result type alias
pub type StorageResult<T> = Result<T, StorageError>;

/// Main error type
///
/// Errors produced by a backend cross the router untouched, so callers can
/// match on the kind regardless of which mount served the request.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path too long: {len} bytes (max {max})")]
    PathTooLong { len: usize, max: usize },

    #[error("Not a folder: {0}")]
    NotAFolder(String),

    #[error("Folder not empty: {0}")]
    FolderNotEmpty(String),

    #[error("Unsupported operation: {operation} on {path}")]
    Unsupported { operation: Operation, path: String },

    #[error("Duplicate mount name: {0}")]
    DuplicateMountName(String),

    #[error("Invalid mount name: {0:?}")]
    InvalidMountName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

impl StorageError {
    pub fn unsupported(operation: Operation, path: impl Into<String>) -> Self {
        Self::Unsupported {
            operation,
            path: path.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::NotFound(_) => true,
            StorageError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, StorageError::Unsupported { .. })
    }

    pub fn is_invalid_path(&self) -> bool {
        matches!(
            self,
            StorageError::InvalidPath(_) | StorageError::PathTooLong { .. }
        )
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for StorageError {
    fn from(e: toml::de::Error) -> Self {
        StorageError::Config(e.to_string())
    }
}
