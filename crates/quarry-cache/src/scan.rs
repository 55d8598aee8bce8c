//! Glob-driven worktree scans shared by the detectors.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use quarry_core::{paths, system_time_ms, IgnoreSet};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// A file matched by a glob scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub relative_path: String,
    pub size: u64,
    pub mtime: u64,
}

/// Compiles patterns with `*` confined to one path segment.
pub fn build_globset(patterns: &[&str]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).literal_separator(true).build()?);
    }
    builder.build()
}

/// Walks the worktree and returns files matching any pattern, sorted by
/// path. Blocking; call from `spawn_blocking`.
pub fn glob_scan(
    root: &Path,
    patterns: &[&str],
    ignore: &IgnoreSet,
) -> Result<Vec<ScannedFile>, globset::Error> {
    let set = build_globset(patterns)?;
    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|e| {
        e.depth() == 0
            || !e.file_type().is_dir()
            || !ignore.is_ignored_dir(&e.file_name().to_string_lossy())
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = paths::relative_to(root, entry.path());
        if !set.is_match(&relative) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Failed to stat {}: {}", relative, e);
                continue;
            }
        };
        files.push(ScannedFile {
            relative_path: relative,
            size: metadata.len(),
            mtime: metadata.modified().map(system_time_ms).unwrap_or(0),
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}
