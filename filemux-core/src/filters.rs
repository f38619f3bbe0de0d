// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path allow-lists

use serde::{Deserialize, Serialize};

/// Decides which backend-local paths a backend may touch.
///
/// `allowed_prefixes: None` allows everything; `Some(vec![])` denies
/// everything. Deny rules win over allow rules, and an exact
/// `allowed_paths` entry lets a single path through a closed prefix list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFilters {
    #[serde(default)]
    pub allowed_prefixes: Option<Vec<String>>,
    #[serde(default)]
    pub disallowed_prefixes: Vec<String>,
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    #[serde(default)]
    pub disallowed_paths: Vec<String>,
}

impl PathFilters {
    pub fn new(allowed_prefixes: Option<Vec<String>>) -> Self {
        Self {
            allowed_prefixes,
            ..Default::default()
        }
    }

    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn deny_all() -> Self {
        Self::new(Some(Vec::new()))
    }

    pub fn with_disallowed_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.disallowed_prefixes = prefixes;
        self
    }

    pub fn with_allowed_paths(mut self, paths: Vec<String>) -> Self {
        self.allowed_paths = paths;
        self
    }

    pub fn with_disallowed_paths(mut self, paths: Vec<String>) -> Self {
        self.disallowed_paths = paths;
        self
    }

    /// True when no path can ever pass.
    pub fn is_deny_all(&self) -> bool {
        matches!(&self.allowed_prefixes, Some(prefixes) if prefixes.is_empty())
            && self.allowed_paths.is_empty()
    }

    pub fn is_allowed(&self, path: &str) -> bool {
        if self.disallowed_paths.iter().any(|p| p == path) {
            return false;
        }
        if self
            .disallowed_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return false;
        }
        if self.allowed_paths.iter().any(|p| p == path) {
            return true;
        }
        match &self.allowed_prefixes {
            None => true,
            Some(prefixes) => prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let filters = PathFilters::allow_all();
        assert!(filters.is_allowed("/"));
        assert!(filters.is_allowed("/anything/at/all.json"));
        assert!(!filters.is_deny_all());
    }

    #[test]
    fn test_deny_all() {
        let filters = PathFilters::deny_all();
        assert!(filters.is_deny_all());
        assert!(!filters.is_allowed("/"));
        assert!(!filters.is_allowed("/a.json"));
    }

    #[test]
    fn test_allowed_prefixes() {
        let filters = PathFilters::new(Some(vec!["/dashboards/".into(), "/img".into()]));
        assert!(filters.is_allowed("/dashboards/a.json"));
        assert!(filters.is_allowed("/img/logo.png"));
        assert!(!filters.is_allowed("/dashboards"));
        assert!(!filters.is_allowed("/secrets/key"));
    }

    #[test]
    fn test_disallowed_wins() {
        let filters = PathFilters::allow_all()
            .with_disallowed_prefixes(vec!["/private/".into()])
            .with_disallowed_paths(vec!["/a.json".into()]);
        assert!(!filters.is_allowed("/private/x"));
        assert!(!filters.is_allowed("/a.json"));
        assert!(filters.is_allowed("/b.json"));
    }

    #[test]
    fn test_allowed_paths_open_a_closed_list() {
        let filters = PathFilters::deny_all().with_allowed_paths(vec!["/readme.md".into()]);
        assert!(!filters.is_deny_all());
        assert!(filters.is_allowed("/readme.md"));
        assert!(!filters.is_allowed("/other.md"));
    }
}
