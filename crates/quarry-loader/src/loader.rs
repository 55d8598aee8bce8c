//! The generic project loader.
//!
//! `analyze` scans the worktree and assembles a `ProjectContext`; `load`
//! hands back the persisted one when there is one. Everything is keyed by
//! the active project's id.

use crate::categorize::categorize_files;
use crate::dependencies::extract_dependencies;
use crate::scanner::{scan_worktree, ScanOptions};
use crate::tree::build_tree;
use chrono::Utc;
use quarry_core::languages::get_profile;
use quarry_core::naming::{is_test_path, test_base_name};
use quarry_core::store::{read_json, write_json};
use quarry_core::{
    paths, Fingerprint, FingerprintProvider, KvStore, Project, ProjectContext, QuarryConfig,
    Result, StoreKey,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Options for [`ContextLoader::analyze`].
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub max_depth: usize,
    pub include_dependencies: bool,
    pub include_tree: bool,
    pub follow_symlinks: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            include_dependencies: true,
            include_tree: true,
            follow_symlinks: false,
        }
    }
}

pub struct ContextLoader {
    project: Arc<Project>,
    fingerprint: Arc<dyn FingerprintProvider>,
    store: Arc<dyn KvStore>,
    config: QuarryConfig,
}

impl ContextLoader {
    pub fn new(
        project: Arc<Project>,
        fingerprint: Arc<dyn FingerprintProvider>,
        store: Arc<dyn KvStore>,
        config: QuarryConfig,
    ) -> Self {
        Self {
            project,
            fingerprint,
            store,
            config,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    fn key(&self) -> StoreKey {
        StoreKey::loader(&self.project.id)
    }

    /// Options seeded from the project config.
    pub fn default_options(&self) -> AnalyzeOptions {
        AnalyzeOptions {
            max_depth: self.config.max_depth,
            ..AnalyzeOptions::default()
        }
    }

    async fn fingerprint(&self) -> Fingerprint {
        match self.fingerprint.load().await {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                warn!("{}, indexing without framework conventions", e);
                Fingerprint::default()
            }
        }
    }

    /// Scans the worktree and builds a fresh context. Nothing is persisted.
    pub async fn analyze(&self, options: AnalyzeOptions) -> Result<ProjectContext> {
        let start = Instant::now();
        let fingerprint = self.fingerprint().await;

        let root = self.project.worktree.clone();
        let ignore = self.config.ignore_set();
        let scan_options = ScanOptions {
            max_depth: options.max_depth,
            follow_symlinks: options.follow_symlinks,
        };
        let scan =
            tokio::task::spawn_blocking(move || scan_worktree(&root, &scan_options, &ignore))
                .await?;

        let index = categorize_files(&scan.entries, &fingerprint);

        let tree = options.include_tree.then(|| {
            let root_name = self
                .project
                .worktree
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            build_tree(&root_name, &scan.entries)
        });

        let dependencies = if options.include_dependencies {
            let profile = fingerprint
                .language
                .as_deref()
                .and_then(|lang| get_profile(lang, fingerprint.has_typescript));
            match profile {
                Some(profile) => Some(extract_dependencies(&index, profile.as_ref()).await),
                None => {
                    debug!(
                        "No import profile for language {:?}, skipping dependencies",
                        fingerprint.language
                    );
                    None
                }
            }
        } else {
            None
        };

        info!(
            "Analyzed {} files ({} tests, {} configs, {} skipped) in {:?}",
            index.len(),
            index.tests.len(),
            index.configs.len(),
            scan.errors.len(),
            start.elapsed()
        );

        let now = Utc::now();
        Ok(ProjectContext {
            project_id: self.project.id.clone(),
            fingerprint,
            tree,
            index,
            dependencies,
            created: now,
            updated: now,
        })
    }

    /// Returns the persisted context, or rebuilds and persists it.
    pub async fn load(&self, force: bool) -> Result<ProjectContext> {
        if !force {
            if let Some(context) = self.get().await {
                debug!("Using persisted context for {}", self.project.id);
                return Ok(context);
            }
        }
        let context = self.analyze(self.default_options()).await?;
        self.save(context).await
    }

    /// Returns the persisted context, if there is a readable one.
    pub async fn get(&self) -> Option<ProjectContext> {
        match read_json(self.store.as_ref(), &self.key()).await {
            Ok(context) => Some(context),
            Err(e) => {
                debug!("No persisted context for {}: {}", self.project.id, e);
                None
            }
        }
    }

    /// Persists `context`, stamping its update time.
    pub async fn save(&self, mut context: ProjectContext) -> Result<ProjectContext> {
        context.updated = Utc::now();
        write_json(self.store.as_ref(), &self.key(), &context).await?;
        Ok(context)
    }

    /// Drops the persisted context.
    pub async fn invalidate(&self) -> Result<()> {
        self.store.remove(&self.key()).await?;
        info!("Invalidated context for {}", self.project.id);
        Ok(())
    }
}

/// Files related to `path`: same-directory siblings with the same
/// extension, import neighbours in both directions, and test/source
/// counterparts sharing a base name.
pub fn find_related_files(path: &str, context: &ProjectContext) -> Vec<String> {
    let path = paths::normalize(path);
    let index = &context.index;
    let mut related: Vec<String> = Vec::new();
    let mut push = |candidate: &str| {
        if candidate != path && !related.iter().any(|r| r == candidate) {
            related.push(candidate.to_string());
        }
    };

    let dir = paths::parent_dir(&path);
    let ext = paths::extension(&path);
    if let Some(same_ext) = index.by_extension.get(&ext) {
        for candidate in same_ext.iter().filter(|c| paths::parent_dir(c) == dir) {
            push(candidate.as_str());
        }
    }

    if let Some(deps) = &context.dependencies {
        for candidate in deps.imports_of(&path).iter().chain(deps.importers_of(&path)) {
            push(candidate.as_str());
        }
    }

    let base = test_base_name(&path);
    let is_test = is_test_path(&path);
    for candidate in index.paths() {
        if is_test_path(candidate) != is_test && test_base_name(candidate) == base {
            push(candidate);
        }
    }

    related
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{MemoryStore, ProjectDirectories, StaticFingerprint};
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn loader_for(root: &Path, fingerprint: Fingerprint) -> ContextLoader {
        ContextLoader::new(
            Arc::new(Project::new("test", root)),
            Arc::new(StaticFingerprint(fingerprint)),
            Arc::new(MemoryStore::new()),
            QuarryConfig::default(),
        )
    }

    fn typescript() -> Fingerprint {
        Fingerprint {
            language: Some("typescript".into()),
            has_typescript: true,
            directories: ProjectDirectories {
                components: vec!["src/components".into()],
                ..ProjectDirectories::default()
            },
            ..Fingerprint::default()
        }
    }

    fn fixture() -> TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/components")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::write(
            root.join("src/components/Login.tsx"),
            "import { api } from '../api';\nexport function Login() {}",
        )
        .unwrap();
        fs::write(root.join("src/components/Login.test.tsx"), "import { Login } from './Login';").unwrap();
        fs::write(root.join("src/components/Header.tsx"), "export function Header() {}").unwrap();
        fs::write(root.join("src/api.ts"), "export const api = {};").unwrap();
        fs::write(root.join("node_modules/lib/index.js"), "").unwrap();
        fs::write(root.join("package.json"), "{}").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_analyze_builds_index_graph_and_tree() {
        let dir = fixture();
        let loader = loader_for(dir.path(), typescript());

        let context = loader.analyze(AnalyzeOptions::default()).await.unwrap();

        assert_eq!(context.index.len(), 5);
        for key in context.index.paths() {
            assert!(!key.starts_with('/'));
            assert!(!key.contains('\\'));
            assert!(!key.starts_with("node_modules"));
        }
        let mut components = context.index.components.clone();
        components.sort();
        assert_eq!(
            components,
            vec!["src/components/Header.tsx", "src/components/Login.tsx"]
        );
        assert_eq!(context.index.tests, vec!["src/components/Login.test.tsx"]);
        assert_eq!(context.index.configs, vec!["package.json"]);

        let deps = context.dependencies.as_ref().unwrap();
        assert_eq!(deps.imports_of("src/components/Login.tsx"), ["src/api.ts".to_string()]);
        assert!(deps
            .importers_of("src/components/Login.tsx")
            .contains(&"src/components/Login.test.tsx".to_string()));

        assert_eq!(context.tree.as_ref().unwrap().file_count(), 5);
    }

    #[tokio::test]
    async fn test_analyze_without_known_language_skips_dependencies() {
        let dir = fixture();
        let loader = loader_for(dir.path(), Fingerprint::default());

        let context = loader.analyze(AnalyzeOptions::default()).await.unwrap();
        assert!(context.dependencies.is_none());
        assert!(context.index.components.is_empty());
    }

    #[tokio::test]
    async fn test_load_twice_returns_persisted_context() {
        let dir = fixture();
        let loader = loader_for(dir.path(), typescript());

        let first = loader.load(false).await.unwrap();
        fs::write(dir.path().join("src/new.ts"), "").unwrap();
        let second = loader.load(false).await.unwrap();

        assert_eq!(first, second);
        assert!(!second.index.contains("src/new.ts"));

        let rebuilt = loader.load(true).await.unwrap();
        assert!(rebuilt.index.contains("src/new.ts"));
    }

    #[tokio::test]
    async fn test_save_then_get_and_invalidate() {
        let dir = fixture();
        let loader = loader_for(dir.path(), typescript());
        assert!(loader.get().await.is_none());

        let context = loader.analyze(AnalyzeOptions::default()).await.unwrap();
        let before = Utc::now();
        let saved = loader.save(context.clone()).await.unwrap();

        let fetched = loader.get().await.unwrap();
        assert_eq!(fetched, saved);
        assert_eq!(fetched.index, context.index);
        assert!(fetched.updated >= before);

        loader.invalidate().await.unwrap();
        assert!(loader.get().await.is_none());
    }

    #[tokio::test]
    async fn test_find_related_files() {
        let dir = fixture();
        let loader = loader_for(dir.path(), typescript());
        let context = loader.analyze(AnalyzeOptions::default()).await.unwrap();

        let related = find_related_files("src/components/Login.tsx", &context);

        assert!(related.contains(&"src/components/Header.tsx".to_string()));
        assert!(related.contains(&"src/components/Login.test.tsx".to_string()));
        assert!(related.contains(&"src/api.ts".to_string()));
        assert!(!related.contains(&"src/components/Login.tsx".to_string()));

        let mut deduped = related.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), related.len());
    }
}
