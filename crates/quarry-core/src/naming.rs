//! File-name conventions shared by the loader, cache and relevance engine.

use crate::paths;

/// Substrings that mark a file name as a test.
pub const TEST_MARKERS: &[&str] = &[".test.", ".spec.", "_test."];

/// Manifest and tool files that are configs regardless of extension.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "package.json",
    "tsconfig.json",
    "jsconfig.json",
    "Cargo.toml",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "requirements.txt",
    "go.mod",
    "Dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "Makefile",
];

pub fn is_test_file_name(name: &str) -> bool {
    TEST_MARKERS.iter().any(|m| name.contains(m))
        || (name.starts_with("test_") && name.ends_with(".py"))
}

pub fn is_test_path(relative: &str) -> bool {
    is_test_file_name(paths::file_name(relative))
}

pub fn is_config_file_name(name: &str) -> bool {
    if CONFIG_FILE_NAMES.contains(&name) {
        return true;
    }
    let lower = name.to_lowercase();
    lower.contains(".config.")
        || lower.starts_with("config.")
        || lower.starts_with(".env")
        || lower.starts_with("tsconfig")
        // .eslintrc, .prettierrc.json, .babelrc.js
        || (lower.starts_with('.') && (lower.ends_with("rc") || lower.contains("rc.")))
}

/// Strips test markers from a file stem: `foo.test` and `test_foo` both give `foo`.
pub fn strip_test_markers(stem: &str) -> &str {
    for suffix in [".test", ".spec", "_test"] {
        if let Some(base) = stem.strip_suffix(suffix) {
            return base;
        }
    }
    stem.strip_prefix("test_").unwrap_or(stem)
}

/// The name a source file and its tests share.
pub fn test_base_name(relative: &str) -> &str {
    strip_test_markers(paths::file_stem(relative))
}
