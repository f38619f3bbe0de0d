// SPDX-License-Identifier: AGPL-3.0-or-later
//! Operations, commands, and their options

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::filters::PathFilters;

/// Every operation a backend can be asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Get,
    Delete,
    Upsert,
    ListFiles,
    ListFolders,
    CreateFolder,
    DeleteFolder,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Get,
        Operation::Delete,
        Operation::Upsert,
        Operation::ListFiles,
        Operation::ListFolders,
        Operation::CreateFolder,
        Operation::DeleteFolder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Delete => "delete",
            Operation::Upsert => "upsert",
            Operation::ListFiles => "list-files",
            Operation::ListFolders => "list-folders",
            Operation::CreateFolder => "create-folder",
            Operation::DeleteFolder => "delete-folder",
        }
    }

    /// Reads degrade to not-found instead of failing when refused
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Operation::Get | Operation::ListFiles | Operation::ListFolders
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Create-or-overwrite request for a single file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertFileCommand {
    pub path: String,
    /// `None` keeps the existing type, or sniffs one from the contents
    pub mime_type: Option<String>,
    /// `None` keeps the existing contents (empty for a new file)
    pub contents: Option<Bytes>,
    /// `None` keeps the existing properties
    pub properties: Option<HashMap<String, String>>,
}

impl UpsertFileCommand {
    pub fn new(path: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            contents: Some(contents.into()),
            ..Default::default()
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_properties(mut self, properties: HashMap<String, String>) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Opaque, backend-owned pagination cursor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// Backend-local path of the last entry already seen
    pub after: Option<String>,
    /// Page size; 0 means unlimited
    pub first: usize,
}

impl Paging {
    pub fn first(first: usize) -> Self {
        Self { after: None, first }
    }

    pub fn after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOptions {
    pub recursive: bool,
    pub with_contents: bool,
    /// Extra filtering on top of whatever the backend enforces
    pub filters: Option<PathFilters>,
}

impl ListOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ..Default::default()
        }
    }
}
