//! Quarry Loader - generic worktree indexing
//!
//! This crate handles the project-wide side of things:
//! - Walking the worktree into a flat `FileIndex`
//! - Bucketing files into tests, configs, components and routes
//! - Pattern-scanning imports into a two-way `DependencyGraph`
//! - Persisting the result as the project's `ProjectContext`
//!
//! Ignored directories (build output, VCS metadata, dependency trees,
//! dot-directories) are never descended into.

mod categorize;
mod dependencies;
mod loader;
mod ranking;
mod scanner;
mod tree;

pub use categorize::categorize_files;
pub use dependencies::extract_dependencies;
pub use loader::{find_related_files, AnalyzeOptions, ContextLoader};
pub use ranking::{compute_centrality, CentralityScores};
pub use scanner::{scan_worktree, ScanOptions, ScanResult};
pub use tree::build_tree;
