//! Cache-side data model and change events.
//!
//! These are the framework-shaped facts derived by the cache detectors,
//! the generic per-path entries the watcher keeps fresh, and the change
//! records that flow from the watcher to the event bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// What a cache entry was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    File,
    Directory,
    Config,
    Route,
    Component,
    Test,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Config => "config",
            Self::Route => "route",
            Self::Component => "component",
            Self::Test => "test",
        };
        write!(f, "{}", s)
    }
}

/// One cache-tracked path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl CacheEntry {
    pub fn new(path: impl Into<String>, kind: EntryType, last_modified: u64, size: u64) -> Self {
        Self {
            path: path.into(),
            kind,
            last_modified,
            size,
            hash: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

/// The routing convention a route file was matched under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Next,
    Nuxt,
    Remix,
    Sveltekit,
    Astro,
    Express,
    Fastapi,
    Flask,
    Django,
    Gin,
}

impl RouteKind {
    /// All kinds, in table order.
    pub const ALL: [RouteKind; 10] = [
        RouteKind::Next,
        RouteKind::Nuxt,
        RouteKind::Remix,
        RouteKind::Sveltekit,
        RouteKind::Astro,
        RouteKind::Express,
        RouteKind::Fastapi,
        RouteKind::Flask,
        RouteKind::Django,
        RouteKind::Gin,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Nuxt => "nuxt",
            Self::Remix => "remix",
            Self::Sveltekit => "sveltekit",
            Self::Astro => "astro",
            Self::Express => "express",
            Self::Fastapi => "fastapi",
            Self::Flask => "flask",
            Self::Django => "django",
            Self::Gin => "gin",
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCache {
    pub path: String,
    pub kind: RouteKind,
    pub framework: String,
    /// HTTP verbs seen in the file. A hint only, never authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Component,
    Hook,
    Util,
    Layout,
    Page,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Component => "component",
            Self::Hook => "hook",
            Self::Util => "util",
            Self::Layout => "layout",
            Self::Page => "page",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCache {
    pub path: String,
    /// File stem, e.g. `Button` for `src/components/Button.tsx`.
    pub name: String,
    pub kind: ComponentKind,
    /// Relative import specifiers as written, e.g. `./Icon`.
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKind {
    Package,
    Typescript,
    Lint,
    Format,
    Build,
    Test,
    Env,
    Docker,
    Other,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Package => "package",
            Self::Typescript => "typescript",
            Self::Lint => "lint",
            Self::Format => "format",
            Self::Build => "build",
            Self::Test => "test",
            Self::Env => "env",
            Self::Docker => "docker",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigCache {
    pub path: String,
    pub name: String,
    pub kind: ConfigKind,
    /// Raw content, capped at the configured character limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Parsed value for `.json` files that parse cleanly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
}

/// Persisted cache output, one per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub project_id: String,
    #[serde(default)]
    pub routes: Vec<RouteCache>,
    #[serde(default)]
    pub components: Vec<ComponentCache>,
    #[serde(default)]
    pub configs: Vec<ConfigCache>,
    #[serde(default)]
    pub test_files: Vec<String>,
    #[serde(default)]
    pub entries: BTreeMap<String, CacheEntry>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl CacheInfo {
    pub fn new(project_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.into(),
            routes: Vec::new(),
            components: Vec::new(),
            configs: Vec::new(),
            test_files: Vec::new(),
            entries: BTreeMap::new(),
            created: now,
            updated: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        write!(f, "{}", s)
    }
}

/// One detected filesystem change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Worktree-relative path.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub timestamp: DateTime<Utc>,
}

impl FileChange {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_serializes_as_type_field() {
        let entry = CacheEntry::new("src/a.ts", EntryType::Component, 10, 20);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "component");
        assert!(json.get("hash").is_none());
    }

    #[test]
    fn test_route_kind_names_are_unique() {
        let mut names: Vec<_> = RouteKind::ALL.iter().map(RouteKind::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RouteKind::ALL.len());
    }
}
