//! Path normalisation and the directory ignore set.
//!
//! Every path Quarry stores is worktree-relative and uses forward slashes,
//! whatever the host platform. Helpers here are the only place that
//! conversion happens.

use std::collections::HashSet;
use std::path::{Component, Path};

/// Directories that never get indexed, on top of every dot-directory.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "coverage",
    "vendor",
    "venv",
    "__pycache__",
    ".git",
    ".svn",
    ".hg",
    ".next",
    ".nuxt",
    ".svelte-kit",
    ".venv",
];

/// Directory names to skip while walking a worktree.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    names: HashSet<String>,
}

impl IgnoreSet {
    /// The built-in set plus any extra directory names.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: HashSet<String> =
            DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect();
        names.extend(extra.into_iter().map(Into::into));
        Self { names }
    }

    /// Whether a directory with this name should be skipped.
    ///
    /// Hidden directories are always skipped.
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        (name.starts_with('.') && name != "." && name != "..") || self.names.contains(name)
    }

    /// Whether any directory segment of a relative path is ignored.
    pub fn is_ignored_path(&self, relative: &str) -> bool {
        let mut segments: Vec<&str> = relative.split('/').collect();
        // Last segment is the file itself.
        segments.pop();
        segments.into_iter().any(|s| self.is_ignored_dir(s))
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::with_extra(Vec::<String>::new())
    }
}

/// Collapses `.` and `..` segments and unifies separators.
///
/// Leading `..` segments that would climb above the root are kept.
pub fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(last) if *last != "..") {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out.join("/")
}

/// Worktree-relative, forward-slash form of `path`.
pub fn relative_to(root: &Path, path: &Path) -> String {
    let stripped = path.strip_prefix(root).unwrap_or(path);
    let joined = stripped
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

/// Directory part of a relative path, empty for top-level files.
pub fn parent_dir(relative: &str) -> &str {
    relative.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Final segment of a relative path.
pub fn file_name(relative: &str) -> &str {
    relative.rsplit_once('/').map(|(_, name)| name).unwrap_or(relative)
}

/// File name without its last extension.
pub fn file_stem(relative: &str) -> &str {
    let name = file_name(relative);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Lower-cased extension without the dot, empty if none.
pub fn extension(relative: &str) -> String {
    let name = file_name(relative);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Resolves `specifier` against the directory of `from`.
pub fn resolve_relative(from: &str, specifier: &str) -> String {
    let dir = parent_dir(from);
    if dir.is_empty() {
        normalize(specifier)
    } else {
        normalize(&format!("{}/{}", dir, specifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("./src/../lib/a.ts"), "lib/a.ts");
        assert_eq!(normalize("src\\components\\A.tsx"), "src/components/A.tsx");
        assert_eq!(normalize("../shared/x.ts"), "../shared/x.ts");
    }

    #[test]
    fn test_relative_to_strips_root() {
        let root = PathBuf::from("/repo");
        assert_eq!(relative_to(&root, Path::new("/repo/src/a.ts")), "src/a.ts");
        assert_eq!(relative_to(&root, Path::new("src/a.ts")), "src/a.ts");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("src/app/page.tsx", "./Button"), "src/app/Button");
        assert_eq!(resolve_relative("src/app/page.tsx", "../lib/db"), "src/lib/db");
        assert_eq!(resolve_relative("main.py", "./utils.py"), "utils.py");
    }

    #[test]
    fn test_name_helpers() {
        assert_eq!(file_name("src/foo.test.ts"), "foo.test.ts");
        assert_eq!(file_stem("src/foo.test.ts"), "foo.test");
        assert_eq!(extension("src/Foo.TSX"), "tsx");
        assert_eq!(extension(".env"), "");
        assert_eq!(file_stem(".env"), ".env");
        assert_eq!(parent_dir("a.ts"), "");
    }

    #[test]
    fn test_ignore_set() {
        let ignore = IgnoreSet::with_extra(["generated"]);
        assert!(ignore.is_ignored_dir("node_modules"));
        assert!(ignore.is_ignored_dir(".cache"));
        assert!(ignore.is_ignored_dir("generated"));
        assert!(!ignore.is_ignored_dir("src"));
        assert!(ignore.is_ignored_path("node_modules/react/index.js"));
        assert!(!ignore.is_ignored_path(".env"));
    }
}
