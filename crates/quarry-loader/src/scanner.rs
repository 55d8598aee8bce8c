//! Worktree scanning.
//!
//! Walks the worktree once, skipping ignored directories without
//! descending into them, and turns every surviving item into a
//! `FileEntry`. A single unreadable item is dropped with a warning; it
//! never aborts the walk.

use ignore::WalkBuilder;
use quarry_core::{paths, system_time_ms, FileEntry, IgnoreSet};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of scanning a worktree.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Files and directories, in walk order.
    pub entries: Vec<FileEntry>,

    /// Items that couldn't be read, with the reason.
    pub errors: Vec<(String, String)>,
}

impl ScanResult {
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter().filter(|e| !e.is_directory)
    }
}

/// Options for a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub max_depth: usize,
    pub follow_symlinks: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            follow_symlinks: false,
        }
    }
}

/// Scans a worktree. Blocking; run it off the async executor.
pub fn scan_worktree(root: &Path, options: &ScanOptions, ignore: &IgnoreSet) -> ScanResult {
    let start = Instant::now();
    let mut result = ScanResult::default();

    let filter = ignore.clone();
    let walker = WalkBuilder::new(root)
        .hidden(false) // dot-files are indexed, dot-directories are filtered below
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(options.follow_symlinks)
        .max_depth(Some(options.max_depth))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entry.depth() == 0
                || !is_dir
                || !filter.is_ignored_dir(&entry.file_name().to_string_lossy())
        })
        .build();

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                result.errors.push((String::new(), e.to_string()));
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        let path = entry.path();
        let relative = paths::relative_to(root, path);
        let metadata = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Failed to stat {}: {}", path.display(), e);
                result.errors.push((relative, e.to_string()));
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let is_directory = metadata.is_dir();
        let extension = if is_directory {
            String::new()
        } else {
            paths::extension(&name)
        };

        debug!("Scanned {}", relative);
        result.entries.push(FileEntry {
            path: path.to_path_buf(),
            relative_path: relative,
            name,
            extension,
            is_directory,
            size: metadata.len(),
            mtime: metadata.modified().map(system_time_ms).unwrap_or(0),
        });
    }

    let duration = start.elapsed();
    info!(
        "Scanned {} entries under {} in {:?}",
        result.entries.len(),
        root.display(),
        duration
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempdir().unwrap();
        let result = scan_worktree(dir.path(), &ScanOptions::default(), &IgnoreSet::default());
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_scan_skips_ignored_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/react")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "export {}").unwrap();
        fs::write(dir.path().join("node_modules/react/index.js"), "").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(dir.path().join(".env"), "KEY=1").unwrap();

        let result = scan_worktree(dir.path(), &ScanOptions::default(), &IgnoreSet::default());
        let paths: Vec<&str> = result
            .entries
            .iter()
            .map(|e| e.relative_path.as_str())
            .collect();

        assert!(paths.contains(&"src"));
        assert!(paths.contains(&"src/index.ts"));
        assert!(paths.contains(&".env"));
        assert!(!paths.iter().any(|p| p.starts_with("node_modules")));
        assert!(!paths.iter().any(|p| p.starts_with(".git")));
    }

    #[test]
    fn test_gitignore_does_not_hide_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join(".gitignore"), "src/generated.ts\n.env.local\n").unwrap();
        fs::write(dir.path().join("src/main.ts"), "").unwrap();
        fs::write(dir.path().join("src/generated.ts"), "").unwrap();
        fs::write(dir.path().join(".env.local"), "KEY=1").unwrap();

        let result = scan_worktree(dir.path(), &ScanOptions::default(), &IgnoreSet::default());
        let mut files: Vec<&str> = result.files().map(|e| e.relative_path.as_str()).collect();
        files.sort();

        assert_eq!(
            files,
            vec![".env.local", ".gitignore", "src/generated.ts", "src/main.ts"]
        );
    }

    #[test]
    fn test_scan_respects_max_depth() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("a/top.ts"), "").unwrap();
        fs::write(dir.path().join("a/b/c/deep.ts"), "").unwrap();

        let options = ScanOptions {
            max_depth: 2,
            ..ScanOptions::default()
        };
        let result = scan_worktree(dir.path(), &options, &IgnoreSet::default());
        let files: Vec<&str> = result.files().map(|e| e.relative_path.as_str()).collect();

        assert_eq!(files, vec!["a/top.ts"]);
    }

    #[test]
    fn test_entries_carry_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Main.TS"), "12345").unwrap();

        let result = scan_worktree(dir.path(), &ScanOptions::default(), &IgnoreSet::default());
        let entry = result.files().next().unwrap();
        assert_eq!(entry.name, "Main.TS");
        assert_eq!(entry.extension, "ts");
        assert_eq!(entry.size, 5);
        assert!(entry.mtime > 0);
        assert!(entry.path.is_absolute());
    }
}
