// SPDX-License-Identifier: AGPL-3.0-or-later
//! Files and listings

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::metadata::FileMetadata;
use crate::operations::Paging;

/// A file: metadata plus (possibly empty) contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub metadata: FileMetadata,
    #[serde(default)]
    pub contents: Bytes,
}

impl File {
    pub fn new(metadata: FileMetadata, contents: Bytes) -> Self {
        Self { metadata, contents }
    }

    pub fn full_path(&self) -> &str {
        &self.metadata.full_path
    }

    /// Same file without its contents, as listings return it by default.
    pub fn without_contents(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            contents: Bytes::new(),
        }
    }
}

/// One page of a file listing
///
/// `last_path` is backend-local and is meant to be fed back as
/// `Paging::after`; the router never rewrites it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilesResponse {
    pub files: Vec<File>,
    pub has_more: bool,
    pub last_path: Option<String>,
}

/// Cut one page out of `files`, which must already be sorted by full path.
pub fn paginate(files: Vec<File>, paging: Option<&Paging>) -> ListFilesResponse {
    let (after, first) = match paging {
        Some(p) => (p.after.as_deref(), p.first),
        None => (None, 0),
    };

    let remaining: Vec<File> = match after {
        Some(after) => files
            .into_iter()
            .skip_while(|f| f.full_path() <= after)
            .collect(),
        None => files,
    };

    let has_more = first > 0 && remaining.len() > first;
    let page: Vec<File> = if first > 0 {
        remaining.into_iter().take(first).collect()
    } else {
        remaining
    };
    let last_path = page.last().map(|f| f.full_path().to_string());

    ListFilesResponse {
        files: page,
        has_more,
        last_path,
    }
}
