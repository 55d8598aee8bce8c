//! The four cache detectors.
//!
//! Each one walks the worktree for its own glob set and returns typed
//! items plus the generic entries that go with them. They share nothing
//! mutable, so `ContextCache::build` runs them side by side. A failed scan
//! leaves that detector's result empty; it never takes the others down.

use crate::heuristics::Heuristics;
use crate::profiles::select_profile;
use crate::scan::{glob_scan, ScannedFile};
use quarry_core::languages::{is_relative, EcmaScriptProfile, ImportProfile};
use quarry_core::naming::is_test_path;
use quarry_core::{
    paths, CacheEntry, ComponentCache, ConfigCache, EntryType, Fingerprint, IgnoreSet, RouteCache,
};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Directories searched for components regardless of fingerprint.
pub const COMPONENT_DIRS: &[&str] = &[
    "components",
    "src/components",
    "app/components",
    "src/app/components",
    "hooks",
    "src/hooks",
    "composables",
    "src/composables",
    "layouts",
    "src/layouts",
    "lib",
    "src/lib",
    "utils",
    "src/utils",
];

const COMPONENT_EXTENSIONS: &str = "{tsx,jsx,ts,js,vue,svelte}";

pub const CONFIG_PATTERNS: &[&str] = &[
    "*.json",
    "*.toml",
    "*.yaml",
    "*.yml",
    "*.config.{js,cjs,mjs,ts,mts}",
    ".*rc",
    ".*rc.{js,cjs,json,yml,yaml}",
    ".env",
    ".env.*",
    ".editorconfig",
    "Dockerfile",
    "Dockerfile.*",
    "Makefile",
    "go.mod",
    "requirements.txt",
    "setup.py",
    "setup.cfg",
    "config/*.{json,js,ts,yml,yaml,toml}",
];

const TEST_SOURCE_EXTENSIONS: &str = "{ts,tsx,js,jsx,mjs,cjs,py,go,rs,vue,svelte}";

pub const TEST_PATTERNS: &[&str] = &[
    "**/*.test.*",
    "**/*.spec.*",
    "**/*_test.*",
    "**/test_*.py",
];

const TEST_DIRS: &[&str] = &["__tests__", "tests", "test", "spec", "e2e"];

/// Items found by one detector plus their generic cache entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Detected<T> {
    pub items: Vec<T>,
    pub entries: Vec<CacheEntry>,
}

impl<T> Default for Detected<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            entries: Vec::new(),
        }
    }
}

/// Where the detectors look.
#[derive(Debug, Clone)]
pub struct ScanScope {
    pub root: PathBuf,
    pub ignore: IgnoreSet,
    /// Maximum characters of config content to keep.
    pub content_limit: usize,
}

impl ScanScope {
    /// Runs a glob scan off the async threads. Failures log and give nothing.
    async fn scan(&self, patterns: Vec<String>, detector: &str) -> Vec<ScannedFile> {
        let root = self.root.clone();
        let ignore = self.ignore.clone();
        let result = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = patterns.iter().map(String::as_str).collect();
            glob_scan(&root, &refs, &ignore)
        })
        .await;

        match result {
            Ok(Ok(files)) => {
                debug!("{} detector matched {} files", detector, files.len());
                files
            }
            Ok(Err(e)) => {
                warn!("{} detector has a bad pattern: {}", detector, e);
                Vec::new()
            }
            Err(e) => {
                warn!("{} detector scan failed: {}", detector, e);
                Vec::new()
            }
        }
    }

    async fn read(&self, relative: &str) -> Option<Vec<u8>> {
        match tokio::fs::read(self.root.join(relative)).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to read {}: {}", relative, e);
                None
            }
        }
    }
}

fn entry_for(file: &ScannedFile, kind: EntryType) -> CacheEntry {
    CacheEntry::new(file.relative_path.clone(), kind, file.mtime, file.size)
}

/// Route files for the framework the fingerprint names, if any.
pub async fn detect_routes(scope: &ScanScope, fingerprint: &Fingerprint) -> Detected<RouteCache> {
    let Some(profile) = select_profile(fingerprint) else {
        debug!("No route profile for frameworks {:?}", fingerprint.framework_names());
        return Detected::default();
    };

    let patterns = profile.patterns().iter().map(|p| p.to_string()).collect();
    let files = scope.scan(patterns, "route").await;

    let mut detected = Detected::default();
    for file in &files {
        let methods = scope
            .read(&file.relative_path)
            .await
            .and_then(|bytes| Heuristics::sniff_methods(&String::from_utf8_lossy(&bytes)));
        detected.items.push(RouteCache {
            path: file.relative_path.clone(),
            kind: profile.kind,
            framework: profile.framework.clone(),
            methods,
        });
        detected.entries.push(entry_for(file, EntryType::Route));
    }
    detected
}

/// Relative import specifiers as written, deduplicated.
pub fn component_imports(source: &str) -> Vec<String> {
    let mut imports: Vec<String> = Vec::new();
    for spec in EcmaScriptProfile::typescript().extract_specifiers(source) {
        if is_relative(&spec) && !imports.contains(&spec) {
            imports.push(spec);
        }
    }
    imports
}

/// Builds the typed record for one component file.
pub fn component_from_source(relative: &str, source: Option<&str>) -> ComponentCache {
    ComponentCache {
        path: relative.to_string(),
        name: Heuristics::component_name(relative).to_string(),
        kind: Heuristics::classify_component(relative),
        imports: source.map(component_imports).unwrap_or_default(),
    }
}

/// UI components, hooks and helpers under the usual directories.
pub async fn detect_components(
    scope: &ScanScope,
    fingerprint: &Fingerprint,
) -> Detected<ComponentCache> {
    let mut dirs: Vec<String> = COMPONENT_DIRS.iter().map(|d| d.to_string()).collect();
    for dir in &fingerprint.directories.components {
        let dir = paths::normalize(dir);
        if !dir.is_empty() && !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    let patterns = dirs
        .iter()
        .map(|d| format!("{}/**/*.{}", d, COMPONENT_EXTENSIONS))
        .collect();
    let files = scope.scan(patterns, "component").await;

    let mut detected = Detected::default();
    for file in &files {
        let path = &file.relative_path;
        if is_test_path(path) || path.ends_with(".d.ts") {
            continue;
        }
        let source = scope
            .read(path)
            .await
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        detected.items.push(component_from_source(path, source.as_deref()));
        detected.entries.push(entry_for(file, EntryType::Component));
    }
    detected
}

/// Hex SHA-256 of raw file content.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Builds the typed record for one config file from its raw bytes.
pub fn config_from_bytes(relative: &str, bytes: Option<&[u8]>, limit: usize) -> ConfigCache {
    let name = paths::file_name(relative).to_string();
    let kind = Heuristics::classify_config(&name);
    let text = bytes.map(String::from_utf8_lossy);

    let parsed = match (&text, paths::extension(relative).as_str()) {
        (Some(text), "json") => match serde_json::from_str(text) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("{} is not valid JSON: {}", relative, e);
                None
            }
        },
        _ => None,
    };

    ConfigCache {
        path: relative.to_string(),
        name,
        kind,
        content: text.map(|t| t.chars().take(limit).collect()),
        parsed,
    }
}

/// Manifests, tool configs and env files.
pub async fn detect_configs(scope: &ScanScope) -> Detected<ConfigCache> {
    let patterns = CONFIG_PATTERNS.iter().map(|p| p.to_string()).collect();
    // A single walk visits each path once, so matches are already unique.
    let files = scope.scan(patterns, "config").await;

    let mut detected = Detected::default();
    for file in &files {
        let bytes = scope.read(&file.relative_path).await;
        detected.items.push(config_from_bytes(
            &file.relative_path,
            bytes.as_deref(),
            scope.content_limit,
        ));
        let mut entry = entry_for(file, EntryType::Config);
        if let Some(bytes) = &bytes {
            entry = entry.with_hash(content_hash(bytes));
        }
        detected.entries.push(entry);
    }
    detected
}

/// Test files by name convention and by conventional test directories.
pub async fn detect_tests(scope: &ScanScope, fingerprint: &Fingerprint) -> Detected<String> {
    let mut patterns: Vec<String> = TEST_PATTERNS.iter().map(|p| p.to_string()).collect();
    for dir in TEST_DIRS {
        patterns.push(format!("**/{}/**/*.{}", dir, TEST_SOURCE_EXTENSIONS));
    }
    for dir in &fingerprint.directories.tests {
        let dir = paths::normalize(dir);
        if !dir.is_empty() {
            patterns.push(format!("{}/**/*.{}", dir, TEST_SOURCE_EXTENSIONS));
        }
    }
    let files = scope.scan(patterns, "test").await;

    let mut detected = Detected::default();
    for file in &files {
        detected.items.push(file.relative_path.clone());
        detected.entries.push(entry_for(file, EntryType::Test));
    }
    detected
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{ComponentKind, ConfigKind, Framework, RouteKind};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scope(root: &Path) -> ScanScope {
        ScanScope {
            root: root.to_path_buf(),
            ignore: IgnoreSet::default(),
            content_limit: 1000,
        }
    }

    fn next_fingerprint() -> Fingerprint {
        Fingerprint {
            language: Some("typescript".into()),
            frameworks: vec![Framework::new("next")],
            has_typescript: true,
            ..Fingerprint::default()
        }
    }

    #[tokio::test]
    async fn test_detect_next_route() {
        let dir = tempdir().unwrap();
        write(dir.path(), "app/dashboard/page.tsx", "export default function Page() {}");
        write(dir.path(), "app/api/users/route.ts", "export async function GET() {}");
        write(dir.path(), "app/dashboard/Chart.tsx", "");

        let routes = detect_routes(&scope(dir.path()), &next_fingerprint()).await;

        assert_eq!(routes.items.len(), 2);
        let page = routes.items.iter().find(|r| r.path == "app/dashboard/page.tsx").unwrap();
        assert_eq!(page.kind, RouteKind::Next);
        assert_eq!(page.framework, "next");
        assert_eq!(page.methods, None);

        let api = routes.items.iter().find(|r| r.path == "app/api/users/route.ts").unwrap();
        assert_eq!(api.methods, Some(vec!["GET".to_string()]));
        assert!(routes.entries.iter().all(|e| e.kind == EntryType::Route));
    }

    #[tokio::test]
    async fn test_no_framework_means_no_routes() {
        let dir = tempdir().unwrap();
        write(dir.path(), "app/page.tsx", "");
        let routes = detect_routes(&scope(dir.path()), &Fingerprint::default()).await;
        assert!(routes.items.is_empty());
    }

    #[tokio::test]
    async fn test_detect_components_skips_tests() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/components/Login.tsx",
            "import { Button } from './Button';\nimport React from 'react';",
        );
        write(dir.path(), "src/components/Login.test.tsx", "");
        write(dir.path(), "src/hooks/useSession.ts", "");

        let found = detect_components(&scope(dir.path()), &Fingerprint::default()).await;

        let paths: Vec<&str> = found.items.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["src/components/Login.tsx", "src/hooks/useSession.ts"]);
        assert_eq!(found.items[0].name, "Login");
        assert_eq!(found.items[0].imports, vec!["./Button".to_string()]);
        assert_eq!(found.items[1].kind, ComponentKind::Hook);
    }

    #[tokio::test]
    async fn test_detect_configs() {
        let dir = tempdir().unwrap();
        write(dir.path(), "package.json", r#"{ "name": "app" }"#);
        write(dir.path(), "tsconfig.json", "{ broken");
        write(dir.path(), ".env", &"X".repeat(1500));
        write(dir.path(), "src/data.json", "{}");

        let found = detect_configs(&scope(dir.path())).await;

        let package = found.items.iter().find(|c| c.name == "package.json").unwrap();
        assert_eq!(package.kind, ConfigKind::Package);
        assert_eq!(package.parsed.as_ref().unwrap()["name"], "app");

        let tsconfig = found.items.iter().find(|c| c.name == "tsconfig.json").unwrap();
        assert!(tsconfig.parsed.is_none());
        assert!(tsconfig.content.is_some());

        let env = found.items.iter().find(|c| c.name == ".env").unwrap();
        assert_eq!(env.kind, ConfigKind::Env);
        assert_eq!(env.content.as_ref().unwrap().chars().count(), 1000);

        assert!(found.items.iter().all(|c| c.path != "src/data.json"));
        assert!(found.entries.iter().all(|e| e.hash.as_ref().map_or(false, |h| h.len() == 64)));
    }

    #[tokio::test]
    async fn test_detect_tests() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/foo.test.ts", "");
        write(dir.path(), "tests/test_models.py", "");
        write(dir.path(), "tests/fixtures/data.json", "");
        write(dir.path(), "src/foo.ts", "");

        let found = detect_tests(&scope(dir.path()), &Fingerprint::default()).await;
        assert_eq!(found.items, vec!["src/foo.test.ts", "tests/test_models.py"]);
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
