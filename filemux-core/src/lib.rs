// SPDX-License-Identifier: AGPL-3.0-or-later
//! filemux core
//!
//! Core traits, types, and path utilities shared by every storage backend
//! and by the router that multiplexes them under one namespace.

pub mod backend;
pub mod entry;
pub mod error;
pub mod filters;
pub mod metadata;
pub mod operations;
pub mod path;

pub use backend::FileStorage;
pub use entry::{File, ListFilesResponse};
pub use error::{StorageError, StorageResult};
pub use filters::PathFilters;
pub use metadata::FileMetadata;
pub use operations::{ListOptions, Operation, Paging, UpsertFileCommand};
pub use path::DELIMITER;
