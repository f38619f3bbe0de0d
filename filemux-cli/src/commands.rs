// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use bytes::Bytes;
use chrono::{DateTime, Utc};
use console::style;
use directories::ProjectDirs;
use filemux_core::{
    FileMetadata, FileStorage, ListOptions, Paging, StorageResult, UpsertFileCommand,
};
use filemux_router::{Router, StorageConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tokio::io::AsyncReadExt;

const CONFIG_FILE: &str = "filemux.toml";

/// Default config location under the platform config dir
fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "hyperpolymath", "filemux")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Load the config and build the router.
///
/// An explicit path must exist. Without one, the platform config file is
/// used if present; otherwise the router starts with no mounts.
pub async fn open_router(config: Option<&Path>, verbose: bool) -> StorageResult<Router> {
    let path = match config {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|p| p.is_file()),
    };

    let config = match path {
        Some(path) => {
            if verbose {
                eprintln!("Config: {}", path.display());
            }
            StorageConfig::load(&path).await?
        }
        None => {
            tracing::warn!("no config file found, starting without mounts");
            StorageConfig::default()
        }
    };

    Router::from_config(&config).await
}

/// Format a timestamp for display
fn format_time(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Format file size
fn format_size(size: u64, human: bool) -> String {
    if human {
        bytesize::ByteSize(size).to_string()
    } else {
        size.to_string()
    }
}

#[derive(Tabled)]
struct LsEntry {
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Type")]
    mime_type: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Path")]
    path: String,
}

impl LsEntry {
    fn new(meta: &FileMetadata, human: bool) -> Self {
        Self {
            size: format_size(meta.size, human),
            mime_type: meta.mime_type.clone(),
            modified: format_time(meta.modified),
            path: meta.full_path.clone(),
        }
    }
}

/// List configured mounts
pub fn mounts(router: &Router) -> StorageResult<()> {
    let names = router.mounts();
    if names.is_empty() {
        println!("(no mounts)");
        return Ok(());
    }

    println!("Mounts:");
    for name in names {
        println!("  /{}", style(name).green());
    }
    Ok(())
}

/// List files under a folder
#[allow(clippy::too_many_arguments)]
pub async fn ls(
    router: &Router,
    path: &str,
    recursive: bool,
    long: bool,
    human: bool,
    first: usize,
    after: Option<String>,
    verbose: bool,
) -> StorageResult<()> {
    if verbose {
        eprintln!("Listing: {path}");
    }

    let paging = (first > 0 || after.is_some()).then(|| Paging { after, first });
    let options = ListOptions {
        recursive,
        ..Default::default()
    };
    let listing = router.list_files(path, paging.as_ref(), &options).await?;

    if listing.files.is_empty() {
        println!("(empty folder)");
    } else if long {
        let entries: Vec<LsEntry> = listing
            .files
            .iter()
            .map(|f| LsEntry::new(&f.metadata, human))
            .collect();
        println!("{}", Table::new(entries));
    } else {
        for file in &listing.files {
            println!("{}", file.full_path());
        }
    }

    if listing.has_more {
        if let Some(last) = &listing.last_path {
            eprintln!(
                "{} more files, continue with --after {last}",
                style("...").dim()
            );
        }
    }

    Ok(())
}

/// List folders under a folder
pub async fn folders(router: &Router, path: &str, recursive: bool, verbose: bool) -> StorageResult<()> {
    if verbose {
        eprintln!("Listing folders: {path}");
    }

    let options = ListOptions {
        recursive,
        ..Default::default()
    };
    let folders = router.list_folders(path, &options).await?;

    if folders.is_empty() {
        println!("(no folders)");
    } else {
        for folder in folders {
            println!("{}", style(&folder.full_path).cyan());
        }
    }
    Ok(())
}

/// Display file contents
pub async fn cat(router: &Router, path: &str, verbose: bool) -> StorageResult<()> {
    if verbose {
        eprintln!("Reading: {path}");
    }

    let file = router.get(path).await?;
    std::io::stdout().write_all(&file.contents)?;
    Ok(())
}

/// Show file information
pub async fn stat(router: &Router, path: &str, verbose: bool) -> StorageResult<()> {
    if verbose {
        eprintln!("Getting info: {path}");
    }

    let meta = router.get(path).await?.metadata;

    println!("  Path: {}", meta.full_path);
    println!("  Type: {}", meta.mime_type);
    println!("  Size: {} ({})", meta.size, bytesize::ByteSize(meta.size));
    println!("  Created: {}", meta.created);
    println!("  Modified: {}", meta.modified);
    if let Some(hash) = &meta.content_hash {
        println!("  Hash: {hash}");
    }
    if !meta.properties.is_empty() {
        let mut keys: Vec<_> = meta.properties.keys().collect();
        keys.sort();
        println!("  Properties:");
        for key in keys {
            println!("    {key} = {}", meta.properties[key]);
        }
    }
    Ok(())
}

/// Create or overwrite a file from a local file or stdin
pub async fn put(
    router: &Router,
    path: &str,
    source: Option<&Path>,
    mime: Option<String>,
    verbose: bool,
) -> StorageResult<()> {
    let contents = match source {
        Some(source) => tokio::fs::read(source).await?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };

    if verbose {
        eprintln!("Writing: {path} ({})", bytesize::ByteSize(contents.len() as u64));
    }

    let mut command = UpsertFileCommand::new(path, Bytes::from(contents));
    if let Some(mime) = mime {
        command = command.with_mime_type(mime);
    }
    router.upsert(&command).await?;

    println!("{} {path}", style("Wrote").green());
    Ok(())
}

/// Remove a file
pub async fn rm(router: &Router, path: &str, verbose: bool) -> StorageResult<()> {
    if verbose {
        eprintln!("Removing: {path}");
    }
    router.delete(path).await
}

/// Create a folder
pub async fn mkdir(router: &Router, path: &str, verbose: bool) -> StorageResult<()> {
    if verbose {
        eprintln!("Creating folder: {path}");
    }
    router.create_folder(path).await?;
    println!("{} {path}", style("Created").green());
    Ok(())
}

/// Remove an empty folder
pub async fn rmdir(router: &Router, path: &str, verbose: bool) -> StorageResult<()> {
    if verbose {
        eprintln!("Removing folder: {path}");
    }
    router.delete_folder(path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(2048, false), "2048");
        assert_ne!(format_size(2048, true), "2048");
    }

    #[tokio::test]
    async fn test_open_router_with_explicit_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join(CONFIG_FILE);
        std::fs::write(&config, "[[backends.memory]]\nname = \"scratch\"\n").unwrap();

        let router = open_router(Some(&config), false).await.unwrap();
        assert_eq!(router.mounts(), vec!["scratch"]);
    }

    #[tokio::test]
    async fn test_open_router_missing_explicit_config() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(open_router(Some(&missing), false).await.is_err());
    }

    #[tokio::test]
    async fn test_put_then_cat_through_router() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join(CONFIG_FILE);
        std::fs::write(&config, "[[backends.memory]]\nname = \"scratch\"\n").unwrap();
        let source = dir.path().join("hello.txt");
        std::fs::write(&source, b"hello").unwrap();

        let router = open_router(Some(&config), false).await.unwrap();
        put(&router, "/scratch/hello.txt", Some(&source), None, false)
            .await
            .unwrap();

        let file = router.get("/scratch/hello.txt").await.unwrap();
        assert_eq!(&file.contents[..], b"hello");
        assert_eq!(file.metadata.mime_type, "text/plain");

        rm(&router, "/scratch/hello.txt", false).await.unwrap();
        assert!(router.get("/scratch/hello.txt").await.unwrap_err().is_not_found());
    }
}
