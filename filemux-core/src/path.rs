// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path utilities for the unified namespace
//!
//! A unified path looks like `/<mount>/<sub>/<file>`. Backends only ever see
//! the backend-local half (`/<sub>/<file>`); these helpers move between the
//! two forms and reject anything that could escape a backend's root.

use crate::error::{StorageError, StorageResult};

/// Segment separator for every path in the system
pub const DELIMITER: &str = "/";

const DELIMITER_CHAR: char = '/';

/// Longest accepted path, in bytes
pub const MAX_PATH_LENGTH: usize = 1024;

/// Build a unified path from a mount name and a backend-local path.
///
/// Repeated delimiters collapse, the result always starts with the
/// delimiter, and a trailing delimiter on `relative` (a folder marker) is
/// kept. An empty mount name yields `relative` normalized on its own.
pub fn join(mount_name: &str, relative: &str) -> String {
    let mut joined = String::from(DELIMITER);
    let segments = mount_name
        .split(DELIMITER_CHAR)
        .chain(relative.split(DELIMITER_CHAR))
        .filter(|s| !s.is_empty());

    for segment in segments {
        if joined.len() > DELIMITER.len() {
            joined.push(DELIMITER_CHAR);
        }
        joined.push_str(segment);
    }

    if joined.len() > DELIMITER.len() && relative.len() > 1 && relative.ends_with(DELIMITER_CHAR) {
        joined.push(DELIMITER_CHAR);
    }
    joined
}

/// Check that a path is absolute and cannot traverse out of its root.
///
/// Rejected: empty paths, relative paths, control characters (NUL
/// included), `.` / `..` segments, and empty segments other than a single
/// trailing delimiter.
pub fn validate_path(path: &str) -> StorageResult<()> {
    if path.is_empty() {
        return Err(StorageError::InvalidPath("empty path".into()));
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(StorageError::PathTooLong {
            len: path.len(),
            max: MAX_PATH_LENGTH,
        });
    }
    if !path.starts_with(DELIMITER_CHAR) {
        return Err(StorageError::InvalidPath(format!(
            "{path}: must start with {DELIMITER}"
        )));
    }
    if path.chars().any(char::is_control) {
        return Err(StorageError::InvalidPath(format!(
            "{}: contains control characters",
            path.escape_debug()
        )));
    }
    if path == DELIMITER {
        return Ok(());
    }

    let body = &path[1..];
    let body = body.strip_suffix(DELIMITER_CHAR).unwrap_or(body);
    for segment in body.split(DELIMITER_CHAR) {
        match segment {
            "" => {
                return Err(StorageError::InvalidPath(format!(
                    "{path}: empty path segment"
                )))
            }
            "." | ".." => {
                return Err(StorageError::InvalidPath(format!(
                    "{path}: relative segment {segment:?}"
                )))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Check a mount name from configuration.
pub fn validate_mount_name(name: &str) -> StorageResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(DELIMITER_CHAR)
        || name.chars().any(char::is_control);
    if invalid {
        return Err(StorageError::InvalidMountName(name.to_string()));
    }
    Ok(())
}

/// Whether `path` addresses `mount_name` or something beneath it.
///
/// Matching is segment-bounded: `/db2/x` is not under `db`.
pub fn is_under_mount(path: &str, mount_name: &str) -> bool {
    if path == mount_name {
        return true;
    }
    match path
        .strip_prefix(DELIMITER_CHAR)
        .and_then(|rest| rest.strip_prefix(mount_name))
    {
        Some(rest) => rest.is_empty() || rest.starts_with(DELIMITER_CHAR),
        None => false,
    }
}

/// Remove the mount segment from a unified path.
///
/// The bare mount (`/m`, `/m/`, `m`) and the root delimiter all map to the
/// backend root `/`. A path not under `mount_name` is returned unchanged.
pub fn strip_mount_prefix(path: &str, mount_name: &str) -> String {
    if path == DELIMITER || path == mount_name {
        return DELIMITER.to_string();
    }
    if !is_under_mount(path, mount_name) {
        return path.to_string();
    }

    let rest = &path[DELIMITER.len() + mount_name.len()..];
    if rest.is_empty() || rest == DELIMITER {
        DELIMITER.to_string()
    } else {
        rest.to_string()
    }
}

pub fn is_root(path: &str) -> bool {
    path.is_empty() || path == DELIMITER
}

/// Last segment of a path, ignoring a trailing folder delimiter.
pub fn name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(DELIMITER_CHAR);
    trimmed
        .rsplit_once(DELIMITER_CHAR)
        .map(|(_, name)| name)
        .unwrap_or(trimmed)
}

/// Parent folder of a path; the root is its own parent.
pub fn parent(path: &str) -> String {
    let trimmed = path.trim_end_matches(DELIMITER_CHAR);
    match trimmed.rsplit_once(DELIMITER_CHAR) {
        Some(("", _)) | None => DELIMITER.to_string(),
        Some((parent, _)) => parent.to_string(),
    }
}

/// Whether `path` lies strictly beneath `folder`.
pub fn is_descendant(path: &str, folder: &str) -> bool {
    if is_root(folder) {
        return !is_root(path);
    }
    let folder = folder.trim_end_matches(DELIMITER_CHAR);
    path.strip_prefix(folder)
        .map(|rest| rest.len() > 1 && rest.starts_with(DELIMITER_CHAR))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("public", "/dashboards/a.json"), "/public/dashboards/a.json");
        assert_eq!(join("public", "dashboards/a.json"), "/public/dashboards/a.json");
        assert_eq!(join("public", "/"), "/public");
        assert_eq!(join("public", ""), "/public");
    }

    #[test]
    fn test_join_collapses_delimiters() {
        assert_eq!(join("public", "//a///b.json"), "/public/a/b.json");
        assert_eq!(join("/public/", "/a"), "/public/a");
    }

    #[test]
    fn test_join_keeps_folder_marker() {
        assert_eq!(join("public", "/dir/"), "/public/dir/");
    }

    #[test]
    fn test_join_without_mount() {
        assert_eq!(join("", "/x.json"), "/x.json");
        assert_eq!(join("", "/"), "/");
        assert_eq!(join("", ""), "/");
    }

    #[test]
    fn test_validate_accepts_absolute_paths() {
        assert!(validate_path("/").is_ok());
        assert!(validate_path("/a").is_ok());
        assert!(validate_path("/a/b/c.json").is_ok());
        assert!(validate_path("/a/b/").is_ok());
        assert!(validate_path("/a/..b/c").is_ok());
    }

    #[test]
    fn test_validate_rejects_traversal() {
        assert!(validate_path("/..").unwrap_err().is_invalid_path());
        assert!(validate_path("/a/../b").unwrap_err().is_invalid_path());
        assert!(validate_path("/a/..").unwrap_err().is_invalid_path());
        assert!(validate_path("/a/./b").unwrap_err().is_invalid_path());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        assert!(validate_path("").is_err());
        assert!(validate_path("a/b").is_err());
        assert!(validate_path("/a//b").is_err());
        assert!(validate_path("//").is_err());
        assert!(validate_path("/a\0b").is_err());
        assert!(validate_path("/a\nb").is_err());
    }

    #[test]
    fn test_validate_rejects_long_paths() {
        let long = format!("/{}", "a".repeat(MAX_PATH_LENGTH));
        assert!(matches!(
            validate_path(&long),
            Err(StorageError::PathTooLong { .. })
        ));
    }

    #[test]
    fn test_validate_mount_name() {
        assert!(validate_mount_name("public").is_ok());
        assert!(validate_mount_name("").is_err());
        assert!(validate_mount_name("a/b").is_err());
        assert!(validate_mount_name("..").is_err());
    }

    #[test]
    fn test_is_under_mount() {
        assert!(is_under_mount("/db", "db"));
        assert!(is_under_mount("/db/", "db"));
        assert!(is_under_mount("/db/x", "db"));
        assert!(is_under_mount("db", "db"));
        assert!(!is_under_mount("/db2/x", "db"));
        assert!(!is_under_mount("/x/db", "db"));
        assert!(!is_under_mount("/", "db"));
    }

    #[test]
    fn test_strip_mount_prefix() {
        assert_eq!(strip_mount_prefix("/public/a/b.json", "public"), "/a/b.json");
        assert_eq!(strip_mount_prefix("/public/dir/", "public"), "/dir/");
    }

    #[test]
    fn test_strip_degenerate_cases_map_to_root() {
        assert_eq!(strip_mount_prefix("/public", "public"), "/");
        assert_eq!(strip_mount_prefix("/public/", "public"), "/");
        assert_eq!(strip_mount_prefix("public", "public"), "/");
        assert_eq!(strip_mount_prefix("/", "public"), "/");
    }

    #[test]
    fn test_strip_foreign_path_unchanged() {
        assert_eq!(strip_mount_prefix("/other/a", "public"), "/other/a");
    }

    #[test]
    fn test_join_strip_round_trip() {
        let paths = [
            "/public/a.json",
            "/public/dir/sub/b.json",
            "/public/dir/",
            "/public/with space/x",
        ];
        for p in paths {
            assert_eq!(join("public", &strip_mount_prefix(p, "public")), p);
        }
    }

    #[test]
    fn test_name_and_parent() {
        assert_eq!(name("/a/b/c.json"), "c.json");
        assert_eq!(name("/a/b/"), "b");
        assert_eq!(name("/"), "");
        assert_eq!(parent("/a/b/c.json"), "/a/b");
        assert_eq!(parent("/a"), "/");
        assert_eq!(parent("/"), "/");
    }

    #[test]
    fn test_is_descendant() {
        assert!(is_descendant("/a/b", "/a"));
        assert!(is_descendant("/a/b", "/a/"));
        assert!(is_descendant("/a/b/c", "/"));
        assert!(!is_descendant("/a", "/a"));
        assert!(!is_descendant("/ab", "/a"));
        assert!(!is_descendant("/", "/"));
    }
}
