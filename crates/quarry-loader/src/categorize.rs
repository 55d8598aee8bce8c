//! Heuristic bucketing of scanned files.

use quarry_core::naming::{is_config_file_name, is_test_file_name};
use quarry_core::{FileEntry, FileIndex, Fingerprint};

/// Whether `relative` sits under one of the given directory prefixes.
fn under_any(relative: &str, dirs: &[String]) -> bool {
    dirs.iter().any(|dir| {
        let dir = dir.trim_matches('/');
        !dir.is_empty()
            && (relative == dir
                || relative
                    .strip_prefix(dir)
                    .is_some_and(|rest| rest.starts_with('/')))
    })
}

/// Builds the generic index from scanned entries.
///
/// Tests are recognised by fingerprint test directories or file-name
/// markers, configs by file name. Components and routes come only from
/// the fingerprint's directory conventions.
pub fn categorize_files(entries: &[FileEntry], fingerprint: &Fingerprint) -> FileIndex {
    let dirs = &fingerprint.directories;
    let mut index = FileIndex::default();

    for entry in entries.iter().filter(|e| !e.is_directory) {
        let path = entry.relative_path.clone();

        let is_test = under_any(&path, &dirs.tests) || is_test_file_name(&entry.name);
        if is_test {
            index.tests.push(path.clone());
        } else {
            if under_any(&path, &dirs.components) {
                index.components.push(path.clone());
            }
            if under_any(&path, &dirs.routes) || under_any(&path, &dirs.pages) {
                index.routes.push(path.clone());
            }
        }
        if is_config_file_name(&entry.name) {
            index.configs.push(path);
        }

        index.insert(entry.clone());
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::ProjectDirectories;
    use std::path::PathBuf;

    fn file(relative: &str) -> FileEntry {
        let name = quarry_core::paths::file_name(relative).to_string();
        FileEntry {
            path: PathBuf::from("/repo").join(relative),
            relative_path: relative.to_string(),
            extension: quarry_core::paths::extension(&name),
            name,
            is_directory: false,
            size: 1,
            mtime: 1,
        }
    }

    #[test]
    fn test_buckets() {
        let fingerprint = Fingerprint {
            directories: ProjectDirectories {
                tests: vec!["e2e".into()],
                components: vec!["src/components".into()],
                routes: vec!["src/routes".into()],
                pages: vec!["src/pages/".into()],
            },
            ..Fingerprint::default()
        };
        let entries = vec![
            file("src/components/Button.tsx"),
            file("src/components/Button.test.tsx"),
            file("src/components-old/Legacy.tsx"),
            file("src/routes/users.ts"),
            file("src/pages/index.tsx"),
            file("e2e/login.ts"),
            file("package.json"),
            file("vite.config.ts"),
        ];

        let index = categorize_files(&entries, &fingerprint);

        assert_eq!(index.len(), 8);
        assert_eq!(index.components, vec!["src/components/Button.tsx"]);
        assert_eq!(index.routes, vec!["src/routes/users.ts", "src/pages/index.tsx"]);
        assert_eq!(
            index.tests,
            vec!["src/components/Button.test.tsx", "e2e/login.ts"]
        );
        assert_eq!(index.configs, vec!["package.json", "vite.config.ts"]);
        assert_eq!(index.by_extension["tsx"].len(), 4);
        assert_eq!(index.by_name["Button.tsx"], vec!["src/components/Button.tsx"]);
    }
}
