//! Loader-side data model.
//!
//! A `FileIndex` is a flat, path-keyed view of the worktree plus a few
//! heuristic buckets. The `DependencyGraph` records intra-project import
//! edges in both directions. Both are persisted inside a `ProjectContext`.

use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// One filesystem item seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path on disk.
    pub path: PathBuf,

    /// Worktree-relative path with forward slashes.
    pub relative_path: String,

    /// File name including extension.
    pub name: String,

    /// Lower-cased extension without the dot, empty if none.
    pub extension: String,

    pub is_directory: bool,

    /// Size in bytes.
    pub size: u64,

    /// Modification time, milliseconds since the Unix epoch.
    pub mtime: u64,
}

/// Generic project index built by the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileIndex {
    /// Files keyed by relative path. Directories live in the tree.
    pub by_path: BTreeMap<String, FileEntry>,

    /// Extension to relative paths, in scan order.
    pub by_extension: BTreeMap<String, Vec<String>>,

    /// File name to relative paths, in scan order.
    pub by_name: BTreeMap<String, Vec<String>>,

    pub routes: Vec<String>,
    pub components: Vec<String>,
    pub tests: Vec<String>,
    pub configs: Vec<String>,
}

impl FileIndex {
    /// Adds a file to the path, extension and name maps.
    pub fn insert(&mut self, entry: FileEntry) {
        let path = entry.relative_path.clone();
        self.by_extension
            .entry(entry.extension.clone())
            .or_default()
            .push(path.clone());
        self.by_name
            .entry(entry.name.clone())
            .or_default()
            .push(path.clone());
        self.by_path.insert(path, entry);
    }

    pub fn get(&self, relative_path: &str) -> Option<&FileEntry> {
        self.by_path.get(relative_path)
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.by_path.contains_key(relative_path)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Iterates all indexed relative paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_path.keys().map(String::as_str)
    }
}

/// Intra-project import edges.
///
/// Every edge is stored twice, once per direction, so the two maps are
/// always mirror images of each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub imports: BTreeMap<String, Vec<String>>,
    pub imported_by: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `from` importing `to`. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let forward = self.imports.entry(from.to_string()).or_default();
        if forward.iter().any(|p| p == to) {
            return;
        }
        forward.push(to.to_string());
        self.imported_by
            .entry(to.to_string())
            .or_default()
            .push(from.to_string());
    }

    /// Files that `path` imports.
    pub fn imports_of(&self, path: &str) -> &[String] {
        self.imports.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files that import `path`.
    pub fn importers_of(&self, path: &str) -> &[String] {
        self.imported_by.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.imports.values().map(Vec::len).sum()
    }

    /// Every path that appears on either end of an edge.
    pub fn files(&self) -> BTreeSet<&str> {
        self.imports
            .keys()
            .chain(self.imported_by.keys())
            .map(String::as_str)
            .collect()
    }
}

/// A node in the optional directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub name: String,

    /// Worktree-relative path, empty for the root.
    pub path: String,

    pub is_directory: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectoryNode>,
}

impl DirectoryNode {
    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_directory: true,
            children: Vec::new(),
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_directory: false,
            children: Vec::new(),
        }
    }

    /// Counts files (not directories) under this node.
    pub fn file_count(&self) -> usize {
        if !self.is_directory {
            return 1;
        }
        self.children.iter().map(DirectoryNode::file_count).sum()
    }
}

/// Persisted loader output, one per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_id: String,
    pub fingerprint: Fingerprint,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<DirectoryNode>,

    pub index: FileIndex,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyGraph>,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}
