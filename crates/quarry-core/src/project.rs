//! The active project: its id and where it lives on disk.

use crate::paths;
use std::path::{Path, PathBuf};

/// Scopes storage keys and relative paths for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    /// Absolute worktree root. All relative paths start here.
    pub worktree: PathBuf,
}

impl Project {
    pub fn new(id: impl Into<String>, worktree: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            worktree: worktree.into(),
        }
    }

    /// Worktree-relative, forward-slash form of `path`.
    ///
    /// Relative inputs are taken as already worktree-relative.
    pub fn relative(&self, path: &Path) -> String {
        paths::relative_to(&self.worktree, path)
    }

    /// Like [`relative`](Self::relative), but None for paths that point
    /// outside the worktree.
    pub fn relative_within(&self, path: &Path) -> Option<String> {
        if path.is_absolute() && !path.starts_with(&self.worktree) {
            return None;
        }
        let relative = self.relative(path);
        (relative != ".." && !relative.starts_with("../")).then_some(relative)
    }

    /// Absolute form of a worktree-relative or absolute path.
    pub fn absolute(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.worktree.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_and_absolute_agree() {
        let project = Project::new("p", "/work/app");
        let abs = project.absolute("src/main.ts");
        assert_eq!(abs, PathBuf::from("/work/app/src/main.ts"));
        assert_eq!(project.relative(&abs), "src/main.ts");
        assert_eq!(project.relative(Path::new("src/main.ts")), "src/main.ts");
    }

    #[test]
    fn test_relative_within_rejects_outside_paths() {
        let project = Project::new("p", "/work/app");
        assert_eq!(
            project.relative_within(Path::new("/work/app/src/a.ts")).as_deref(),
            Some("src/a.ts")
        );
        assert_eq!(
            project.relative_within(Path::new("src/../lib/b.ts")).as_deref(),
            Some("lib/b.ts")
        );
        assert_eq!(project.relative_within(Path::new("/etc/passwd")), None);
        assert_eq!(project.relative_within(Path::new("/work/application/x.ts")), None);
        assert_eq!(project.relative_within(Path::new("../x")), None);
        assert_eq!(project.relative_within(Path::new("src/../../x")), None);
    }
}
